//! Terminal confirmation channel.

use async_trait::async_trait;
use roundtable_core::{
    ConfirmationChannel, ConfirmationDecision, ConfirmationRequest, HitlError, HitlResult,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Asks the operator on stderr and reads one line from stdin per request.
///
/// Input follows [`ConfirmationDecision::from_console_line`]: enter approves,
/// `exit` aborts, `reject[: reason]` skips pending code, anything else is
/// posted as the participant's reply.
pub struct ConsoleConfirmation {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleConfirmation {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for ConsoleConfirmation {
    fn default() -> Self {
        Self::new()
    }
}

/// Text shown to the operator for one request.
pub fn render_request(request: &ConfirmationRequest) -> String {
    let mut out = String::new();
    if let Some(latest) = &request.latest_message {
        out.push_str(&format!("\n--- {} (#{})\n", latest.author, latest.seq));
        out.push_str(latest.content.trim_end());
        out.push('\n');
    }
    for (i, block) in request.pending_code.iter().enumerate() {
        let lang = block.language.as_deref().unwrap_or("?");
        let file = block.filename.as_deref().unwrap_or("<generated>");
        out.push_str(&format!("\n[pending block {} | {} | {}]\n", i + 1, lang, file));
        out.push_str(block.code.trim_end());
        out.push('\n');
    }
    out.push_str(&format!("\n{}\n> ", request.prompt));
    out
}

#[async_trait]
impl ConfirmationChannel for ConsoleConfirmation {
    async fn confirm(&self, request: ConfirmationRequest) -> HitlResult<ConfirmationDecision> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(render_request(&request).as_bytes()).await?;
        stderr.flush().await?;

        let mut lines = self.lines.lock().await;
        match lines.next_line().await? {
            Some(line) => Ok(ConfirmationDecision::from_console_line(&line)),
            None => Err(HitlError::ChannelClosed),
        }
    }

    fn name(&self) -> &str {
        "console"
    }
}
