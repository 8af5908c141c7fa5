//! Source notes appended to assistant replies.

/// Appended to replies grounded in the full PDF text.
pub const FULL_TEXT_NOTE: &str = "📄 本回复基于PDF全文内容";
/// Appended to replies that only saw the abstract.
pub const ABSTRACT_ONLY_NOTE: &str = "📝 本回复仅基于论文摘要，可能存在幻觉";

const FULL_TEXT_MARKER: &str = "本回复基于PDF全文内容";
const ABSTRACT_ONLY_MARKER: &str = "本回复仅基于论文摘要";

/// Append the note matching `is_pdf_processed`, unless the reply already
/// carries a source note.
pub fn annotate(reply: &str, is_pdf_processed: bool) -> String {
    let reply = reply.trim_end();
    if reply.contains(FULL_TEXT_MARKER) || reply.contains(ABSTRACT_ONLY_MARKER) {
        return reply.to_string();
    }
    let note = if is_pdf_processed {
        FULL_TEXT_NOTE
    } else {
        ABSTRACT_ONLY_NOTE
    };
    format!("{reply}\n\n{note}")
}
