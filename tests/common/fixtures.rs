//! Test fixtures and PDF builders.
//!
//! Provides a builder for multi-page test PDFs and ready-made services,
//! following the Builder pattern for clean test setup.

use anonymizer::{AnonymizationService, ConfigStore, ServerConfig};
use anyhow::Result;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builder for creating multi-page test PDFs.
///
/// Every line is written as its own text object so extraction returns one
/// line per entry.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_page(&["Patient record", "ID 123456782"])
///     .with_page(&["Second page"])
///     .build(Path::new("/tmp/test.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    /// Creates a new test PDF builder with default settings.
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: Vec::new(),
            page_width: Mm(210.0),  // A4 width
            page_height: Mm(297.0), // A4 height
        }
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Appends a page holding the given lines.
    pub fn with_page(mut self, lines: &[&str]) -> Self {
        self.pages.push(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Renders the PDF into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let empty = vec![Vec::new()];
        let pages = if self.pages.is_empty() { &empty } else { &self.pages };

        for (index, lines) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(page1).get_layer(layer1)
            } else {
                let (page, layer) = doc.add_page(self.page_width, self.page_height, "Layer 1");
                doc.get_page(page).get_layer(layer)
            };

            let mut y = 270.0;
            for line in lines {
                layer.use_text(line.as_str(), 11.0, Mm(20.0), Mm(y), &font);
                y -= 7.0;
            }
        }

        Ok(doc.save_to_bytes()?)
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let bytes = self.to_bytes()?;
        let mut writer = BufWriter::new(fs::File::create(output_path)?);
        std::io::Write::write_all(&mut writer, &bytes)?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Service over the built-in configuration.
pub fn builtin_service() -> AnonymizationService {
    service_with(ServerConfig::builtin())
}

/// Service over a custom configuration.
pub fn service_with(config: ServerConfig) -> AnonymizationService {
    let store = Arc::new(ConfigStore::new(config).expect("fixture configuration is valid"));
    AnonymizationService::new(store)
}

/// Five pages of ordinary text with no personal data.
pub fn clean_report_pages() -> Vec<Vec<&'static str>> {
    vec![
        vec!["Quarterly Report", "Summary of operations for the period."],
        vec!["Section 2", "Inventory levels remained stable throughout."],
        vec!["Section 3", "No incidents were recorded at the facility."],
        vec!["Section 4", "Maintenance was completed ahead of schedule."],
        vec!["Section 5", "End of report."],
    ]
}

/// Builder preloaded with [`clean_report_pages`].
pub fn clean_report() -> TestPdfBuilder {
    clean_report_pages()
        .iter()
        .fold(TestPdfBuilder::new().with_title("Report"), |b, lines| {
            b.with_page(lines)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let builder = TestPdfBuilder::new()
            .with_title("Test")
            .with_page(&["a", "b"])
            .with_page(&["c"]);

        assert_eq!(builder.title, "Test");
        assert_eq!(builder.pages.len(), 2);
        assert_eq!(builder.pages[0].len(), 2);
    }
}
