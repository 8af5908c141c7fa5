//! PDF location for a paper, derived from its landing page URL.

use paperpal_chat::PaperDto;

const ARXIV_PDF_BASE: &str = "https://arxiv.org/pdf/";

/// Best-effort PDF URL. `None` means the chat runs on the abstract only.
///
/// arXiv `/abs/` pages map to `/pdf/`; Hugging Face paper pages are keyed
/// by arXiv id.
pub fn derive_pdf_url(paper: &PaperDto) -> Option<String> {
    let url = paper.url.trim();

    if url.is_empty() {
        let is_arxiv = paper.source.eq_ignore_ascii_case("arxiv");
        return (is_arxiv && !paper.id.trim().is_empty())
            .then(|| format!("{ARXIV_PDF_BASE}{}", paper.id.trim()));
    }
    if url.ends_with(".pdf") || url.contains("/pdf/") {
        return Some(url.to_string());
    }
    if url.contains("arxiv.org/abs/") {
        return Some(url.replacen("/abs/", "/pdf/", 1));
    }
    if let Some((_, rest)) = url.split_once("huggingface.co/papers/") {
        let id = rest.trim_end_matches('/');
        if !id.is_empty() && !id.contains('/') {
            return Some(format!("{ARXIV_PDF_BASE}{id}"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, source: &str, url: &str) -> PaperDto {
        PaperDto {
            id: id.into(),
            title: "T".into(),
            abstract_text: "A".into(),
            authors: Vec::new(),
            source: source.into(),
            url: url.into(),
            total_score: None,
            one_liner: None,
        }
    }

    #[test]
    fn arxiv_abs_becomes_pdf() {
        let p = paper("2401.00001", "arxiv", "https://arxiv.org/abs/2401.00001v2");
        assert_eq!(
            derive_pdf_url(&p).as_deref(),
            Some("https://arxiv.org/pdf/2401.00001v2")
        );
    }

    #[test]
    fn direct_pdf_is_kept() {
        let p = paper("x", "arxiv", "https://example.org/paper.pdf");
        assert_eq!(derive_pdf_url(&p).as_deref(), Some("https://example.org/paper.pdf"));
    }

    #[test]
    fn huggingface_page_maps_to_arxiv() {
        let p = paper("2401.00002", "huggingface", "https://huggingface.co/papers/2401.00002/");
        assert_eq!(
            derive_pdf_url(&p).as_deref(),
            Some("https://arxiv.org/pdf/2401.00002")
        );
    }

    #[test]
    fn missing_url_falls_back_to_arxiv_id() {
        let p = paper("2401.00003", "arxiv", "");
        assert_eq!(
            derive_pdf_url(&p).as_deref(),
            Some("https://arxiv.org/pdf/2401.00003")
        );
        assert_eq!(derive_pdf_url(&paper("abc", "huggingface", "")), None);
    }

    #[test]
    fn unknown_pages_have_no_pdf() {
        let p = paper("x", "arxiv", "https://example.org/blog/post");
        assert_eq!(derive_pdf_url(&p), None);
    }
}
