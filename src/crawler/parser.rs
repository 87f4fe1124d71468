//! HTML tokenizer for extracting visible text
//!
//! Visibility follows the tag stream, not a repaired document tree: text
//! counts only between a `<body>` start tag and its end tag, and never while
//! a `script`, `style` or `noscript` element is open. Each flag is switched
//! by its own start and end tags. Text outside `<body>` (before it, after
//! `</body>`, or in a document that never opens one) is ignored.
//!
//! Input is fed chunk by chunk so a response body never has to be held in
//! memory as a whole.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use tokio::sync::mpsc;

/// Tag-driven visibility state plus the text collected so far
#[derive(Debug, Default)]
struct VisibleTextSink {
    in_body: bool,
    in_script: bool,
    in_style: bool,
    in_noscript: bool,

    /// Current run of character tokens, joined until the next non-text token
    pending: String,
    fragments: Vec<String>,
}

impl VisibleTextSink {
    fn is_visible(&self) -> bool {
        self.in_body && !self.in_script && !self.in_style && !self.in_noscript
    }

    fn push_text(&mut self, text: &str) {
        if self.is_visible() {
            self.pending.push_str(text);
        }
    }

    /// Ends the current text token
    fn flush(&mut self) {
        let text = std::mem::take(&mut self.pending);
        if !text.trim().is_empty() {
            self.fragments.push(text);
        }
    }

    fn on_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        let open = tag.kind == TagKind::StartTag;
        let flag = match &*tag.name {
            "body" => &mut self.in_body,
            "script" => &mut self.in_script,
            "style" => &mut self.in_style,
            "noscript" => &mut self.in_noscript,
            _ => return TokenSinkResult::Continue,
        };
        *flag = open;

        // The tokenizer alone cannot tell that these elements hold raw text.
        match &*tag.name {
            "script" if open => TokenSinkResult::RawData(RawKind::ScriptData),
            "style" | "noscript" if open => TokenSinkResult::RawData(RawKind::Rawtext),
            _ => TokenSinkResult::Continue,
        }
    }
}

impl TokenSink for VisibleTextSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => {
                self.push_text(&text);
                TokenSinkResult::Continue
            }
            Token::NullCharacterToken => {
                self.push_text("\u{FFFD}");
                TokenSinkResult::Continue
            }
            // Recoverable markup errors do not interrupt a text run
            Token::ParseError(_) => TokenSinkResult::Continue,
            Token::TagToken(tag) => {
                self.flush();
                self.on_tag(&tag)
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) | Token::EOFToken => {
                self.flush();
                TokenSinkResult::Continue
            }
        }
    }
}

/// Incremental visible-text extractor
///
/// Bytes are decoded as UTF-8 as they arrive; a multi-byte character split
/// across two chunks is carried over, and invalid sequences are replaced
/// with U+FFFD.
///
/// # Example
///
/// ```
/// use word_harvest::crawler::TextExtractor;
///
/// let mut extractor = TextExtractor::new();
/// extractor.feed(b"<body>Hel");
/// extractor.feed(b"lo <script>ignored</script> World</body>");
/// assert_eq!(extractor.finish(), vec!["Hello ", " World"]);
/// ```
pub struct TextExtractor {
    tokenizer: Tokenizer<VisibleTextSink>,
    input: BufferQueue,
    undecoded: Vec<u8>,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(VisibleTextSink::default(), TokenizerOpts::default()),
            input: BufferQueue::new(),
            undecoded: Vec::new(),
        }
    }

    /// Tokenizes the next chunk of the document
    pub fn feed(&mut self, bytes: &[u8]) {
        self.undecoded.extend_from_slice(bytes);
        let text = decode_available(&mut self.undecoded);
        if !text.is_empty() {
            self.push(text);
        }
    }

    /// Ends the document and returns its visible text fragments in order
    pub fn finish(mut self) -> Vec<String> {
        if !self.undecoded.is_empty() {
            let rest = String::from_utf8_lossy(&self.undecoded).into_owned();
            self.undecoded.clear();
            self.push(rest);
        }

        self.tokenizer.end();
        let mut sink = self.tokenizer.sink;
        sink.flush();
        sink.fragments
    }

    fn push(&mut self, text: String) {
        self.input.push_back(StrTendril::from(text));
        // The sink never hands back a script handle, so this drains the queue.
        while let TokenizerResult::Script(()) = self.tokenizer.feed(&mut self.input) {}
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes the longest valid UTF-8 prefix of `bytes` and removes it
///
/// Invalid sequences become U+FFFD. An incomplete sequence at the end stays
/// in `bytes` until more input arrives.
fn decode_available(bytes: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut consumed = 0;

    loop {
        match std::str::from_utf8(&bytes[consumed..]) {
            Ok(valid) => {
                text.push_str(valid);
                consumed = bytes.len();
                break;
            }
            Err(e) => {
                let valid_end = consumed + e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&bytes[consumed..valid_end]));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        consumed = valid_end + len;
                    }
                    None => {
                        consumed = valid_end;
                        break;
                    }
                }
            }
        }
    }

    bytes.drain(..consumed);
    text
}

/// Extracts the visible text fragments of an HTML document, in document order
///
/// # Example
///
/// ```
/// use word_harvest::crawler::extract_visible_text;
///
/// let html = "<body>Hello <script>ignored</script> World</body>";
/// let fragments = extract_visible_text(html);
/// assert_eq!(fragments, vec!["Hello ", " World"]);
/// ```
pub fn extract_visible_text(html: &str) -> Vec<String> {
    let mut extractor = TextExtractor::new();
    extractor.feed(html.as_bytes());
    extractor.finish()
}

/// Runs an extractor over chunks arriving on `chunks` until the sender closes
///
/// Blocks the calling thread, so it belongs on a blocking task.
pub fn extract_from_chunks(mut chunks: mpsc::Receiver<Vec<u8>>) -> Vec<String> {
    let mut extractor = TextExtractor::new();
    while let Some(chunk) = chunks.blocking_recv() {
        extractor.feed(&chunk);
    }
    extractor.finish()
}
