use crate::corpus::Corpus;
use crate::error::{DiaryError, Result};
use crate::scorer::ScoreSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use tracing::info;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Write the per-record scores as CSV (UTF-8 with BOM), one row per
/// surviving record in load order. The translated-caption column appears
/// only when the translation stage ran.
pub fn write_csv(path: &Path, corpus: &Corpus, scores: &ScoreSet) -> Result<()> {
    if scores.len() != corpus.len() {
        return Err(DiaryError::Inference(format!(
            "score count {} does not match record count {}",
            scores.len(),
            corpus.len()
        )));
    }

    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);

    let translated = corpus
        .records
        .iter()
        .any(|r| r.translated_caption.is_some());

    let mut header = vec!["image", "caption"];
    if translated {
        header.push("translated_caption");
    }
    header.extend(["keyword", "human_label", "bert_precision", "bert_recall", "bert_f1"]);
    writer.write_record(&header)?;

    for (i, record) in corpus.records.iter().enumerate() {
        let mut row = vec![record.image_id.clone(), record.caption.clone()];
        if translated {
            row.push(record.translated_caption.clone().unwrap_or_default());
        }
        row.push(record.keyword.clone());
        row.push(record.judgment.clone());
        row.push(format!("{:.6}", scores.precision[i]));
        row.push(format!("{:.6}", scores.recall[i]));
        row.push(format!("{:.6}", scores.f1[i]));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = corpus.len(), "wrote score table");
    Ok(())
}

/// Summary counts for the qualitative judgment report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgmentStats {
    pub total: usize,
    pub matches: usize,
    pub no_matches: usize,
}

impl JudgmentStats {
    /// Percentage of records judged as matching, over surviving records only.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_match(&self) -> f32 {
        self.matches as f32 / self.total as f32 * 100.0
    }
}

/// Render the qualitative judgment table as HTML.
///
/// Only records whose image file exists under `img_dir` get a table row; the
/// summary block covers every surviving record. An empty corpus is an error
/// (the percentages would otherwise divide by zero).
pub fn write_html(path: &Path, img_dir: &Path, corpus: &Corpus) -> Result<JudgmentStats> {
    if corpus.is_empty() {
        return Err(DiaryError::EmptyAggregate("judged records"));
    }

    let stats = JudgmentStats {
        total: corpus.len(),
        matches: corpus.match_count(),
        no_matches: corpus.len() - corpus.match_count(),
    };

    let mut html = String::from(
        "<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         table { border-collapse: collapse; width: 100%; }\n\
         th, td { border: 1px solid black; padding: 8px; text-align: center; }\n\
         img { max-width: 300px; max-height: 300px; }\n\
         .stats { margin: 20px 0; padding: 10px; background-color: #f0f0f0; border-radius: 5px; }\n\
         </style>\n</head>\n<body>\n",
    );

    let _ = write!(
        html,
        "<div class=\"stats\">\n<h2>Summary</h2>\n\
         <p>Total images: {}</p>\n\
         <p>Judged similar (O): {} ({:.1}%)</p>\n\
         <p>Judged not similar (X): {} ({:.1}%)</p>\n</div>\n",
        stats.total,
        stats.matches,
        stats.percent_match(),
        stats.no_matches,
        100.0 - stats.percent_match(),
    );

    html.push_str(
        "<table>\n<tr>\n<th>Image</th>\n<th>Caption</th>\n<th>Keyword</th>\n\
         <th>Human judgment</th>\n</tr>\n",
    );

    for record in &corpus.records {
        let img_path = img_dir.join(&record.image_id);
        if !img_path.exists() {
            continue;
        }
        let _ = write!(
            html,
            "<tr>\n<td><img src=\"{}\" alt=\"{}\"></td>\n<td>{}</td>\n<td>{}</td>\n<td>{}</td>\n</tr>\n",
            escape(&img_path.display().to_string()),
            escape(&record.image_id),
            escape(&record.caption),
            escape(&record.keyword),
            escape(&record.judgment),
        );
    }

    html.push_str("</table>\n</body>\n</html>\n");
    std::fs::write(path, html)?;
    info!(path = %path.display(), total = stats.total, "wrote judgment report");
    Ok(stats)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusRecord, HumanLabel};

    fn corpus_of(records: Vec<CorpusRecord>) -> Corpus {
        Corpus {
            records,
            skipped: 0,
        }
    }

    fn record(image_id: &str, judgment: &str) -> CorpusRecord {
        CorpusRecord {
            image_id: image_id.to_string(),
            caption: "a dog running".to_string(),
            keyword: "dog".to_string(),
            judgment: judgment.to_string(),
            translated_caption: None,
        }
    }

    #[test]
    fn csv_starts_with_bom_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let corpus = corpus_of(vec![record("b.jpg", "O"), record("a.jpg", "X")]);
        let scores = ScoreSet {
            precision: vec![0.9, 0.3],
            recall: vec![0.8, 0.2],
            f1: vec![0.85, 0.25],
        };
        write_csv(&path, &corpus, &scores).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "image,caption,keyword,human_label,bert_precision,bert_recall,bert_f1"
        );
        assert!(lines[1].starts_with("b.jpg,"));
        assert!(lines[2].starts_with("a.jpg,"));
    }

    #[test]
    fn translated_column_appears_only_when_stage_ran() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let mut rec = record("a.jpg", "O");
        rec.translated_caption = Some("달리는 강아지".to_string());
        let corpus = corpus_of(vec![rec]);
        let scores = ScoreSet {
            precision: vec![0.9],
            recall: vec![0.8],
            f1: vec![0.85],
        };
        write_csv(&path, &corpus, &scores).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("translated_caption"));
        assert!(text.contains("달리는 강아지"));
    }

    #[test]
    fn score_length_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus_of(vec![record("a.jpg", "O")]);
        let err = write_csv(&dir.path().join("x.csv"), &corpus, &ScoreSet::default());
        assert!(err.is_err());
    }

    #[test]
    fn html_lists_only_existing_images() {
        let dir = tempfile::tempdir().unwrap();
        let img_dir = dir.path().join("all_imgs");
        std::fs::create_dir(&img_dir).unwrap();
        std::fs::write(img_dir.join("present.jpg"), b"").unwrap();

        let corpus = corpus_of(vec![record("present.jpg", "O"), record("absent.jpg", "X")]);
        let out = dir.path().join("report.html");
        let stats = write_html(&out, &img_dir, &corpus).unwrap();

        assert_eq!(
            stats,
            JudgmentStats {
                total: 2,
                matches: 1,
                no_matches: 1
            }
        );
        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("present.jpg"));
        // The missing image gets no table row, but still counts in the stats.
        assert!(!html.contains("absent.jpg"));
        assert!(html.contains("Total images: 2"));
        assert!(html.contains("(50.0%)"));
    }

    #[test]
    fn empty_corpus_has_no_percentages() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_html(
            &dir.path().join("report.html"),
            dir.path(),
            &Corpus::default(),
        );
        assert!(matches!(err, Err(DiaryError::EmptyAggregate(_))));
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape("a <b> & \"c\""), "a &lt;b&gt; &amp; &quot;c&quot;");
    }

    #[test]
    fn label_counts_use_the_match_bucket() {
        let corpus = corpus_of(vec![record("a.jpg", "O"), record("b.jpg", "?")]);
        assert_eq!(corpus.match_count(), 1);
        assert_eq!(corpus.records[1].label(), HumanLabel::NoMatch);
    }
}
