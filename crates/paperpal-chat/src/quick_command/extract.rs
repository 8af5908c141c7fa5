//! Offline, regex-based extraction over a paper abstract.
//!
//! Used when the answer service cannot run a quick command. Results are
//! best effort.

use std::sync::LazyLock;

use regex::Regex;

use super::QuickCommand;

const MAX_FORMULAS: usize = 5;

const FORMULAS_FOUND: &str = "在摘要中找到以下可能的公式或数学表达：";
const FORMULAS_NOT_FOUND: &str =
    "摘要中没有找到明确的公式。建议打开 PDF 全文，查看方法部分的公式推导。";
const LINKS_FOUND: &str = "在摘要中找到以下代码链接：";
const LINKS_MENTIONED: &str =
    "摘要提到了代码或实现，但没有给出具体链接。可以在论文主页或 GitHub 上按论文标题搜索。";
const LINKS_NOT_FOUND: &str =
    "摘要中没有提到代码或实现。可以在 Papers with Code 或 GitHub 上按论文标题搜索。";

static MATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\$\$(.+?)\$\$|\\\[(.+?)\\\]|\\\((.+?)\\\)|\$([^$\n]+?)\$")
        .expect("math regex is valid")
});

static EQUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z][A-Za-z0-9_]*(?:\([^()\n]*\))?\s*=\s*[^,;.。，；\n]+")
        .expect("equation regex is valid")
});

static FORMULA_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:equations?|formulas?|formulae|formulations?|loss functions?|objective functions?|theorems?)\b|公式|方程|损失函数",
    )
    .expect("formula keyword regex is valid")
});

static CODE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://(?:www\.)?(?:github\.com|gitlab\.com|bitbucket\.org|huggingface\.co|paperswithcode\.com)/[^\s<>()\[\]{}"'，。；]+"#,
    )
    .expect("code url regex is valid")
});

static CODE_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:codes?|implementations?|repository|repositories|open[- ]?source[d]?)\b|代码|实现|开源",
    )
    .expect("code keyword regex is valid")
});

fn push_unique(findings: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() && !findings.iter().any(|f| f == candidate) {
        findings.push(candidate.to_string());
    }
}

/// Math spans first, then `X = ...` patterns, then keyword sentences.
pub fn extract_formulas(text: &str) -> Vec<String> {
    let mut findings = Vec::new();

    for caps in MATH_RE.captures_iter(text) {
        if let Some(inner) = caps.iter().skip(1).flatten().next() {
            push_unique(&mut findings, inner.as_str());
        }
    }

    let remaining = MATH_RE.replace_all(text, " ");
    for m in EQUATION_RE.find_iter(&remaining) {
        push_unique(&mut findings, m.as_str());
    }

    for sentence in remaining.split(['.', '。', '!', '?', '！', '？', '\n']) {
        if FORMULA_KEYWORD_RE.is_match(sentence) {
            push_unique(&mut findings, sentence);
        }
    }

    findings.truncate(MAX_FORMULAS);
    findings
}

pub fn extract_code_links(text: &str) -> Vec<String> {
    let mut links = Vec::new();
    for m in CODE_URL_RE.find_iter(text) {
        push_unique(&mut links, m.as_str().trim_end_matches(['.', ',', ';', ':']));
    }
    links
}

fn numbered(header: &str, items: &[String]) -> String {
    let mut out = String::from(header);
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, item));
    }
    out
}

/// Render the offline reply for `command` from `abstract_text`.
pub fn offline_answer(command: QuickCommand, abstract_text: &str) -> String {
    match command {
        QuickCommand::Formula => {
            let formulas = extract_formulas(abstract_text);
            if formulas.is_empty() {
                FORMULAS_NOT_FOUND.to_string()
            } else {
                numbered(FORMULAS_FOUND, &formulas)
            }
        }
        QuickCommand::CodeLink => {
            let links = extract_code_links(abstract_text);
            if !links.is_empty() {
                numbered(LINKS_FOUND, &links)
            } else if CODE_KEYWORD_RE.is_match(abstract_text) {
                LINKS_MENTIONED.to_string()
            } else {
                LINKS_NOT_FOUND.to_string()
            }
        }
    }
}
