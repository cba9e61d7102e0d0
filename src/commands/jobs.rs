use crate::exec::{CommandResult, ExecutionContext};

/// `jobs`: one line per tracked job, ordered by id.
pub fn jobs(_args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let all = ctx.jobs.get_all();
    if all.is_empty() {
        return CommandResult::success("No background jobs tracked.");
    }
    let rows: Vec<String> = all
        .iter()
        .map(|job| {
            let exit = job
                .exit_code
                .map(|c| format!(" exit:{c}"))
                .unwrap_or_default();
            format!(
                "#{} [{}] {}{exit} ({:.1}s)",
                job.id,
                job.status.as_str(),
                job.command,
                job.duration_ms() as f64 / 1000.0
            )
        })
        .collect();
    CommandResult::success(rows.join("\n"))
}

/// `killjobs <id>`
pub fn killjobs(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let Some(raw) = args.first() else {
        return CommandResult::failure(1, "killjobs: job id required");
    };
    let id = match raw.strip_prefix('#').unwrap_or(raw.as_str()).parse::<u64>() {
        Ok(id) if id > 0 => id,
        _ => return CommandResult::failure(1, "killjobs: invalid job id"),
    };
    if !ctx.jobs.kill(id) {
        return CommandResult::failure(1, format!("killjobs: job #{id} not found"));
    }
    CommandResult::success(format!("Terminated job #{id}"))
}
