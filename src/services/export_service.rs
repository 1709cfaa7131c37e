use crate::error::{Error, Result};
use crate::models::question::QuestionSet;
use rust_xlsxwriter::*;

/// Printable content for one question, in the order it appears in the export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSection {
    pub heading: String,
    pub meta: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

pub struct ExportService;

impl ExportService {
    pub fn sections(questions: &QuestionSet) -> Vec<ExportSection> {
        questions
            .iter()
            .map(|(id, q)| ExportSection {
                heading: format!("Q{}. {}", id, q.mcq),
                meta: format!("Topic: {} | Difficulty: {}", q.topic, q.difficulty),
                options: q
                    .options
                    .iter()
                    .map(|(key, text)| format!("{}) {}", key, text))
                    .collect(),
                answer: match q.answer_text() {
                    Some(text) => format!("Answer: {}) {}", q.answer, text),
                    None => format!("Answer: {}", q.answer),
                },
                explanation: if q.explanation.trim().is_empty() {
                    "Explanation: (none given)".to_string()
                } else {
                    format!("Explanation: {}", q.explanation)
                },
            })
            .collect()
    }

    /// Build an XLSX workbook: one separated section per question on the first
    /// sheet, plus a compact answer key. Pure function of `questions`.
    pub fn generate_questions_xlsx(questions: &QuestionSet) -> Result<Vec<u8>> {
        if questions.is_empty() {
            return Err(Error::BadRequest("There are no questions to export".to_string()));
        }

        let mut workbook = Workbook::new();

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B); // Slate 800
        let muted_text = Color::RGB(0x64748B); // Slate 500
        let answer_color = Color::RGB(0x047857); // Emerald 700
        let separator_color = Color::RGB(0xCBD5E1); // Slate 300
        let header_bg = Color::RGB(0x0F172A); // Slate 900
        let border_color = Color::RGB(0xE2E8F0); // Slate 200

        let sections = Self::sections(questions);

        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name("Questions")?;
            worksheet.set_column_width(0, 100)?;

            let title_format = Format::new()
                .set_font_size(16)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(primary_color)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter);
            let subtitle_format = Format::new()
                .set_font_size(10)
                .set_italic()
                .set_font_color(muted_text)
                .set_align(FormatAlign::Center);
            let heading_format = Format::new().set_bold().set_font_size(12).set_text_wrap();
            let meta_format = Format::new().set_italic().set_font_color(muted_text);
            let option_format = Format::new().set_indent(1).set_text_wrap();
            let answer_format = Format::new().set_bold().set_font_color(answer_color);
            let explanation_format = Format::new().set_text_wrap();
            let separator_format = Format::new()
                .set_border_bottom(FormatBorder::Medium)
                .set_border_color(separator_color);

            worksheet.set_row_height(0, 36)?;
            worksheet.write_string_with_format(0, 0, "Multiple Choice Questions", &title_format)?;
            worksheet.write_string_with_format(
                1,
                0,
                format!("Total questions: {}", sections.len()),
                &subtitle_format,
            )?;

            let mut row: u32 = 3;
            for section in &sections {
                worksheet.write_string_with_format(row, 0, &section.heading, &heading_format)?;
                row += 1;
                worksheet.write_string_with_format(row, 0, &section.meta, &meta_format)?;
                row += 1;
                for option in &section.options {
                    worksheet.write_string_with_format(row, 0, option, &option_format)?;
                    row += 1;
                }
                worksheet.write_string_with_format(row, 0, &section.answer, &answer_format)?;
                row += 1;
                worksheet.write_string_with_format(
                    row,
                    0,
                    &section.explanation,
                    &explanation_format,
                )?;
                row += 1;
                worksheet.write_blank(row, 0, &separator_format)?;
                row += 2;
            }
        }

        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name("Answer Key")?;

            let columns = [
                ("№", 8.0),
                ("Question", 60.0),
                ("Topic", 24.0),
                ("Difficulty", 14.0),
                ("Answer", 40.0),
            ];
            for (i, (_, width)) in columns.iter().enumerate() {
                worksheet.set_column_width(i as u16, *width)?;
            }

            let header_format = Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(header_bg)
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let cell_format = Format::new()
                .set_text_wrap()
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            for (i, (name, _)) in columns.iter().enumerate() {
                worksheet.write_string_with_format(0, i as u16, *name, &header_format)?;
            }

            for (idx, (id, q)) in questions.iter().enumerate() {
                let row = 1 + idx as u32;
                let answer = match q.answer_text() {
                    Some(text) => format!("{}) {}", q.answer, text),
                    None => q.answer.clone(),
                };
                worksheet.write_string_with_format(row, 0, id, &cell_format)?;
                worksheet.write_string_with_format(row, 1, &q.mcq, &cell_format)?;
                worksheet.write_string_with_format(row, 2, &q.topic, &cell_format)?;
                worksheet.write_string_with_format(row, 3, &q.difficulty, &cell_format)?;
                worksheet.write_string_with_format(row, 4, &answer, &cell_format)?;
            }

            worksheet.set_freeze_panes(1, 0)?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionRecord;
    use indexmap::IndexMap;

    fn set(n: usize) -> QuestionSet {
        (1..=n)
            .map(|i| QuestionRecord {
                id: i.to_string(),
                mcq: format!("Question {}?", i),
                topic: "Cloud Computing".into(),
                difficulty: "Easy".into(),
                options: IndexMap::from([
                    ("a".into(), "Yes".into()),
                    ("b".into(), "No".into()),
                    ("c".into(), "Maybe".into()),
                ]),
                answer: "b".into(),
                explanation: if i % 2 == 0 { String::new() } else { "Because.".into() },
            })
            .collect()
    }

    #[test]
    fn one_section_per_question_regardless_of_paging() {
        let questions = set(12);
        let sections = ExportService::sections(&questions);
        assert_eq!(sections.len(), 12);
        assert_eq!(sections[0].heading, "Q1. Question 1?");
        assert_eq!(sections[0].meta, "Topic: Cloud Computing | Difficulty: Easy");
        assert_eq!(sections[0].options, vec!["a) Yes", "b) No", "c) Maybe"]);
        assert_eq!(sections[0].answer, "Answer: b) No");
        assert_eq!(sections[1].explanation, "Explanation: (none given)");
    }

    #[test]
    fn workbook_is_a_zip_stream() {
        let bytes = ExportService::generate_questions_xlsx(&set(3)).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_set_cannot_be_exported() {
        assert!(matches!(
            ExportService::generate_questions_xlsx(&QuestionSet::new()),
            Err(Error::BadRequest(_))
        ));
    }
}
