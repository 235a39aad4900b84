//! One-shot completions printed straight to stdout.

use std::error::Error;
use std::io::Write;

use crate::core::chat_stream::FragmentStream;
use crate::core::client::GenerativeApi;

pub async fn run_query(api: &dyn GenerativeApi, prompt: &str) -> Result<(), Box<dyn Error>> {
    let stream = api.complete(prompt);
    let mut stdout = std::io::stdout();
    print_stream(stream, &mut stdout).await?;
    Ok(())
}

/// Write fragments as they arrive. An error fragment ends the output and
/// becomes the returned error; whatever was printed before it stays.
pub async fn print_stream(
    mut stream: FragmentStream,
    out: &mut impl Write,
) -> Result<String, Box<dyn Error>> {
    let mut reply = String::new();

    while let Some(fragment) = stream.next().await {
        if let Some(error) = fragment.error {
            writeln!(out)?;
            return Err(error.into());
        }

        write!(out, "{}", fragment.text)?;
        out.flush()?;
        reply.push_str(&fragment.text);

        if fragment.is_final {
            break;
        }
    }

    writeln!(out)?;
    Ok(reply)
}

/// Join the query words, the contents of `--file`, and piped stdin into
/// one prompt. `None` when there is nothing to send.
pub fn build_prompt(
    words: &[String],
    file_contents: Option<String>,
    piped: Option<String>,
) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(contents) = file_contents {
        parts.push(contents);
    }
    if !words.is_empty() {
        parts.push(words.join(" "));
    }
    if let Some(piped) = piped {
        parts.push(piped);
    }

    let prompt = parts
        .into_iter()
        .map(|part| part.trim_end().to_string())
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (!prompt.is_empty()).then_some(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_stream::Fragment;

    #[tokio::test]
    async fn prints_fragments_until_done() {
        let (sender, stream) = FragmentStream::channel(8);
        tokio::spawn(async move {
            sender.send(Fragment::partial("The sky ")).await;
            sender.send(Fragment::last("is blue.")).await;
            sender.send(Fragment::partial("ignored")).await;
        });

        let mut out = Vec::new();
        let reply = print_stream(stream, &mut out).await.unwrap();

        assert_eq!(reply, "The sky is blue.");
        assert_eq!(String::from_utf8(out).unwrap(), "The sky is blue.\n");
    }

    #[tokio::test]
    async fn error_fragment_becomes_the_error() {
        let (sender, stream) = FragmentStream::channel(8);
        tokio::spawn(async move {
            sender.send(Fragment::partial("Hal")).await;
            sender.send(Fragment::error("Error: connection reset")).await;
        });

        let mut out = Vec::new();
        let err = print_stream(stream, &mut out).await.unwrap_err();

        assert_eq!(err.to_string(), "Error: connection reset");
        assert_eq!(String::from_utf8(out).unwrap(), "Hal\n");
    }

    #[test]
    fn prompt_joins_sources_in_order() {
        let words = vec!["summarise".to_string(), "this".to_string()];
        let prompt = build_prompt(&words, None, Some("line one\nline two\n".into()));
        assert_eq!(prompt.as_deref(), Some("summarise this\nline one\nline two"));
    }

    #[test]
    fn file_contents_come_first() {
        let words = vec!["and".to_string(), "then?".to_string()];
        let prompt = build_prompt(&words, Some("Once upon a time\n".into()), None);
        assert_eq!(prompt.as_deref(), Some("Once upon a time\nand then?"));
    }

    #[test]
    fn nothing_to_send() {
        assert_eq!(build_prompt(&[], None, None), None);
        assert_eq!(build_prompt(&[], None, Some("  \n".into())), None);
    }
}
