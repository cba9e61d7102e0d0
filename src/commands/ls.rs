use crate::error::ShellError;
use crate::exec::{CommandResult, ExecutionContext};

/// `ls [-l] [path]`
///
/// Short form prints one name per line with a `/` suffix on directories;
/// `-l` prints `dir |file`, the size right-aligned to 8 and the name.
/// Entries are sorted by name.
pub fn ls(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let flag = args.iter().find(|a| a.starts_with('-'));
    let target = args.iter().find(|a| !a.starts_with('-'));
    let detailed = flag.is_some_and(|f| f.contains('l'));
    match list(target.map(String::as_str), detailed, ctx) {
        Ok(out) => CommandResult::success(out),
        Err(e) => CommandResult::from_error("ls", &e),
    }
}

fn list(target: Option<&str>, detailed: bool, ctx: &ExecutionContext) -> Result<String, ShellError> {
    let dir = ctx.resolve(target)?;
    ctx.check_cancelled()?;
    let display = target.unwrap_or(".");

    let mut entries = std::fs::read_dir(&dir)
        .map_err(|e| ShellError::io(display, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ShellError::io(display, e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        ctx.check_cancelled()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follow symlinks so a link to a directory lists as one.
        let meta = std::fs::metadata(entry.path())
            .or_else(|_| entry.metadata())
            .map_err(|e| ShellError::io(name.clone(), e))?;
        let line = match (detailed, meta.is_dir()) {
            (false, true) => format!("{name}/"),
            (false, false) => name,
            (true, is_dir) => {
                let kind = if is_dir { "dir " } else { "file" };
                format!("{kind} {:>8} {name}", meta.len())
            }
        };
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{args, ctx};
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "12345").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        dir
    }

    #[test]
    fn short_listing_sorted_with_dir_suffix() {
        let dir = fixture();
        let r = ls(&[], &ctx(dir.path()));
        assert_eq!(r.exit_code, 0);
        assert_eq!(r.stdout, "a.txt\nb.txt\nsrc/");
    }

    #[test]
    fn long_listing() {
        let dir = fixture();
        let r = ls(&args(&["-l"]), &ctx(dir.path()));
        let lines: Vec<&str> = r.stdout.lines().collect();
        assert_eq!(lines[0], "file        0 a.txt");
        assert_eq!(lines[1], "file        5 b.txt");
        assert!(lines[2].starts_with("dir "));
        assert!(lines[2].ends_with(" src"));
    }

    #[test]
    fn path_argument() {
        let dir = fixture();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        let r = ls(&args(&["src"]), &ctx(dir.path()));
        assert_eq!(r.stdout, "main.rs");
    }

    #[test]
    fn empty_dir_is_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let r = ls(&[], &ctx(dir.path()));
        assert_eq!(r, CommandResult::success(""));
    }

    #[test]
    fn missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let r = ls(&args(&["nope"]), &ctx(dir.path()));
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.starts_with("ls: nope: "));
    }

    #[test]
    fn traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let r = ls(&args(&["../.."]), &ctx(dir.path()));
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("Path traversal"));
    }
}
