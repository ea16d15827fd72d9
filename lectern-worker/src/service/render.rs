//! Artifact rendering
//!
//! Produces the three output artifacts from a [`StudyMaterial`]: a JSON
//! summary, a readable Markdown document and a tab-separated flashcard deck
//! that spaced-repetition tools can import.

use serde::Serialize;

use super::transform::{StudyMaterial, StudySection};

pub const SUMMARY_FILE: &str = "summary.json";
pub const DOCUMENT_FILE: &str = "lecture.md";
pub const FLASHCARDS_FILE: &str = "flashcards.tsv";

/// One rendered artifact ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: &'static str,
    /// Entry under which the artifact's URL is reported
    pub manifest_key: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct Summary<'a> {
    title: &'a str,
    total_slides: usize,
    sections: &'a [StudySection],
    flashcards: Vec<SummaryCard<'a>>,
}

#[derive(Serialize)]
struct SummaryCard<'a> {
    section: u32,
    front: &'a str,
    back: &'a str,
}

/// Render every artifact for `material`, in upload order
pub fn render_all(material: &StudyMaterial) -> Result<Vec<Artifact>, serde_json::Error> {
    Ok(vec![
        Artifact {
            file_name: SUMMARY_FILE,
            manifest_key: "summary_json_url",
            content_type: "application/json",
            bytes: summary_json(material)?,
        },
        Artifact {
            file_name: DOCUMENT_FILE,
            manifest_key: "docx_url",
            content_type: "text/markdown; charset=utf-8",
            bytes: lecture_markdown(material).into_bytes(),
        },
        Artifact {
            file_name: FLASHCARDS_FILE,
            manifest_key: "anki_url",
            content_type: "text/tab-separated-values; charset=utf-8",
            bytes: flashcards_tsv(material).into_bytes(),
        },
    ])
}

pub fn summary_json(material: &StudyMaterial) -> Result<Vec<u8>, serde_json::Error> {
    let flashcards = material
        .sections
        .iter()
        .flat_map(|section| {
            section.flashcards.iter().map(move |card| SummaryCard {
                section: section.number,
                front: &card.question,
                back: &card.answer,
            })
        })
        .collect();

    serde_json::to_vec_pretty(&Summary {
        title: &material.title,
        total_slides: material.sections.len(),
        sections: &material.sections,
        flashcards,
    })
}

pub fn lecture_markdown(material: &StudyMaterial) -> String {
    let mut out = String::new();
    let title = if material.title.trim().is_empty() {
        "Lecture"
    } else {
        material.title.trim()
    };
    out.push_str(&format!("# {}\n", title));

    for section in &material.sections {
        out.push_str(&format!("\n## {}. {}\n", section.number, section.title));

        if !section.explanation.is_empty() {
            out.push('\n');
            for paragraph in &section.explanation {
                out.push_str(paragraph);
                out.push_str("\n\n");
            }
        }

        if !section.key_points.is_empty() {
            out.push_str("### Key points\n\n");
            for point in &section.key_points {
                out.push_str(&format!("- {}\n", point));
            }
            out.push('\n');
        }

        if !section.connections.trim().is_empty() {
            out.push_str(&format!("### Connections\n\n{}\n\n", section.connections.trim()));
        }

        if !section.summary.trim().is_empty() {
            out.push_str(&format!("> {}\n", section.summary.trim()));
        }
    }

    out
}

/// Cards with an empty side are skipped
pub fn flashcards_tsv(material: &StudyMaterial) -> String {
    let mut out = String::from("#separator:tab\n#columns:Front\tBack\tTags\n");

    for section in &material.sections {
        for card in &section.flashcards {
            let front = tsv_field(&card.question);
            let back = tsv_field(&card.answer);
            if front.is_empty() || back.is_empty() {
                continue;
            }
            out.push_str(&format!("{}\t{}\tslide_{}\n", front, back, section.number));
        }
    }

    out
}

fn tsv_field(value: &str) -> String {
    value
        .trim()
        .replace('\t', " ")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}
