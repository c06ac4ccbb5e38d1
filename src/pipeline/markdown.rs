//! Plain text to Markdown assembly for extracted PDF pages.

/// Render the text of one page as Markdown blocks.
///
/// Blank lines end a paragraph. Wrapped lines inside a paragraph are joined
/// with a single space. A short title-case or all-caps line that opens a
/// paragraph and carries no trailing punctuation becomes a `##` heading.
pub fn page_to_markdown(text: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph = String::new();

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        if paragraph.is_empty() && is_heading(trimmed) {
            blocks.push(format!("## {}", trimmed));
            continue;
        }

        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(trimmed);
    }
    flush(&mut paragraph, &mut blocks);

    blocks.join("\n\n")
}

/// Join rendered pages, skipping pages that produced no text.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn flush(paragraph: &mut String, blocks: &mut Vec<String>) {
    if !paragraph.is_empty() {
        blocks.push(std::mem::take(paragraph));
    }
}

fn is_heading(line: &str) -> bool {
    line.chars().count() < 80
        && !line.ends_with(['.', ',', ';', ':'])
        && line.chars().any(char::is_alphabetic)
        && (is_all_caps(line) || is_title_case(line))
}

fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
}

fn is_title_case(text: &str) -> bool {
    // Words of three letters or fewer ("of", "and", "the") do not count.
    let significant: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .collect();

    if significant.len() < 2 {
        return false;
    }

    significant
        .iter()
        .all(|w| w.chars().next().is_some_and(char::is_uppercase))
}
