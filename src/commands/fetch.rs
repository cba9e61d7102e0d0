use std::io::Read;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;

use crate::error::ShellError;
use crate::exec::{CommandResult, ExecutionContext};
use crate::limits::MAX_FETCH_BODY_BYTES;
use crate::security::validate_fetch_url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// `fetch <url|file>`
///
/// URLs (anything with a scheme) are validated and fetched with a GET;
/// everything else is a capped local file read.
pub fn fetch(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let Some(target) = args.first() else {
        return CommandResult::failure(1, "fetch: target required");
    };
    let outcome = if looks_like_url(target) {
        validate_fetch_url(target).and_then(|url| {
            let client = http_client()?;
            fetch_remote(&client, url, ctx)
        })
    } else {
        ctx.read_capped_file(target)
    };
    match outcome {
        Ok(body) => CommandResult::success(body),
        Err(e) => CommandResult::from_error("fetch", &e),
    }
}

fn looks_like_url(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    target.contains("://") || lower.starts_with("http:") || lower.starts_with("https:")
}

fn http_client() -> Result<Client, ShellError> {
    Ok(Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("nexshell/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// GET `url` and render `Status`, headers, `---`, then the body.
///
/// The body is read in chunks, checking for cancellation between them, and
/// abandoned once it passes [`MAX_FETCH_BODY_BYTES`].
fn fetch_remote(client: &Client, url: Url, ctx: &ExecutionContext) -> Result<String, ShellError> {
    ctx.check_cancelled()?;
    log::info!("fetch {url}");
    let mut response = client.get(url).send()?;
    ctx.check_cancelled()?;

    let status = response.status().as_u16();
    let headers: Vec<String> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            )
        })
        .collect();

    let mut body = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        ctx.check_cancelled()?;
        let n = response
            .read(&mut chunk)
            .map_err(|e| ShellError::io("read response", e))?;
        if n == 0 {
            break;
        }
        if body.len() + n > MAX_FETCH_BODY_BYTES {
            log::warn!("fetch body over {MAX_FETCH_BODY_BYTES} bytes, abandoning");
            return Err(ShellError::too_large(
                "Response body",
                MAX_FETCH_BODY_BYTES,
            ));
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Ok(format!(
        "Status: {status}\n{}\n---\n{}",
        headers.join("\n"),
        String::from_utf8_lossy(&body)
    ))
}
