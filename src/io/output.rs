use crate::core::{DetectionReport, RefactoringSuggestion};
use clap::ValueEnum;
use colored::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_results(&mut self, report: &DetectionReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_results(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_results(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_summary(report)?;
        self.write_groups(report)?;
        self.write_suggestions(report)?;
        self.write_warnings(report)?;
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Duplicate Pattern Report")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Generated: {}",
            report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        let summary = report.summary();
        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        writeln!(self.writer, "| Patterns extracted | {} |", summary.total_patterns)?;
        writeln!(self.writer, "| Duplicate groups | {} |", summary.total_groups)?;
        writeln!(self.writer, "| Class-level groups | {} |", summary.class_groups)?;
        writeln!(self.writer, "| Suggestions | {} |", summary.total_suggestions)?;
        writeln!(self.writer, "| Skipped files | {} |", summary.skipped_files)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_groups(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        if report.groups.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "## Duplicate Groups")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| Category | Members | Similarity | Representative |"
        )?;
        writeln!(
            self.writer,
            "|----------|---------|------------|----------------|"
        )?;
        for group in &report.groups {
            let rep = &report.patterns[group.representative.index()].pattern;
            writeln!(
                self.writer,
                "| {} | {} | {:.2} | `{}:{}` {} |",
                group.category.display_name(),
                group.members.len(),
                group.aggregate_similarity,
                rep.file.display(),
                rep.span.start_line,
                rep.owner.name
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_suggestions(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        if report.suggestions.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "## Refactoring Suggestions")?;
        writeln!(self.writer)?;
        for (rank, suggestion) in report.suggestions.iter().enumerate() {
            writeln!(
                self.writer,
                "{}. **{}** (confidence {:.2}): {}",
                rank + 1,
                suggestion.strategy.display_name(),
                suggestion.confidence,
                suggestion.rationale
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_warnings(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        if report.warnings.is_empty() {
            return Ok(());
        }

        writeln!(self.writer, "## Warnings")?;
        writeln!(self.writer)?;
        for warning in &report.warnings {
            writeln!(
                self.writer,
                "- `{}`: {}",
                warning.file.display(),
                warning.message
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter;

impl Default for TerminalWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalWriter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for TerminalWriter {
    fn write_results(&mut self, report: &DetectionReport) -> anyhow::Result<()> {
        print_header();
        print_summary(report);
        print_groups(report);
        print_suggestions(&report.suggestions);
        print_warnings(report);
        Ok(())
    }
}

fn print_header() {
    println!("{}", "Duplicate Pattern Report".bold().blue());
    println!("{}", "========================".blue());
    println!();
}

fn print_summary(report: &DetectionReport) {
    let summary = report.summary();
    println!("{}", "Summary:".bold());
    println!("  Patterns extracted: {}", summary.total_patterns);
    println!("  Duplicate groups: {}", summary.total_groups);
    println!("  Class-level groups: {}", summary.class_groups);
    println!("  Suggestions: {}", summary.total_suggestions);
    if summary.skipped_files > 0 {
        println!(
            "  Skipped files: {}",
            summary.skipped_files.to_string().yellow()
        );
    }
    println!();
}

fn print_groups(report: &DetectionReport) {
    if report.groups.is_empty() {
        println!("{}", "No duplicate groups found.".green());
        println!();
        return;
    }

    println!("{} ({}):", "Duplicate Groups".bold(), report.groups.len());
    for group in &report.groups {
        let rep = &report.patterns[group.representative.index()].pattern;
        let similarity = format!("{:.2}", group.aggregate_similarity);
        let similarity = if group.aggregate_similarity >= 0.95 {
            similarity.red()
        } else {
            similarity.yellow()
        };
        println!(
            "  {} x{} ({}) - {}:{} {}",
            group.category.display_name().cyan(),
            group.members.len(),
            similarity,
            rep.file.display(),
            rep.span.start_line,
            rep.owner.name
        );
    }
    println!();
}

fn print_suggestions(suggestions: &[RefactoringSuggestion]) {
    if suggestions.is_empty() {
        return;
    }

    println!("{} (top {}):", "Suggestions".bold(), suggestions.len().min(10));
    for (rank, suggestion) in suggestions.iter().take(10).enumerate() {
        println!(
            "  {}. {} ({:.2}) - {}",
            rank + 1,
            suggestion.strategy.display_name().green(),
            suggestion.confidence,
            suggestion.rationale
        );
    }
    println!();
}

fn print_warnings(report: &DetectionReport) {
    if report.warnings.is_empty() {
        return;
    }

    println!("{} ({}):", "Warnings".yellow().bold(), report.warnings.len());
    for warning in &report.warnings {
        println!("  - {}: {}", warning.file.display(), warning.message);
    }
    println!();
}

pub fn create_writer(format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(std::io::stdout())),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(std::io::stdout())),
        OutputFormat::Terminal => Box::new(TerminalWriter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::core::ast::{AstNode, FunctionDecl, NodeKind, ParsedFile, Span};
    use crate::pipeline::DuplicateDetector;

    fn sum_function(name: &str, start: usize) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            params: vec!["items".to_string()],
            is_async: false,
            return_type: None,
            span: Span::lines(start, start + 5),
            body: vec![
                AstNode::new(NodeKind::Loop, Span::lines(start + 1, start + 3)).with_children(
                    vec![AstNode::new(NodeKind::Assign, Span::lines(start + 2, start + 2))
                        .with_children(vec![
                            AstNode::new(NodeKind::Identifier, Span::lines(start + 2, start + 2))
                                .with_value("total"),
                            AstNode::new(NodeKind::BinaryOp, Span::lines(start + 2, start + 2))
                                .with_value("+")
                                .with_children(vec![
                                    AstNode::new(
                                        NodeKind::Identifier,
                                        Span::lines(start + 2, start + 2),
                                    )
                                    .with_value("total"),
                                    AstNode::new(
                                        NodeKind::Identifier,
                                        Span::lines(start + 2, start + 2),
                                    )
                                    .with_value("item"),
                                ]),
                        ])],
                ),
                AstNode::new(NodeKind::Return, Span::lines(start + 4, start + 4)).with_children(
                    vec![AstNode::new(NodeKind::Identifier, Span::lines(start + 4, start + 4))
                        .with_value("total")],
                ),
            ],
        }
    }

    fn sample_report() -> DetectionReport {
        let files = vec![ParsedFile {
            path: "math.ts".into(),
            functions: vec![sum_function("sumPrices", 1), sum_function("sumWeights", 20)],
            classes: Vec::new(),
        }];
        DuplicateDetector::new(DetectionConfig::default())
            .unwrap()
            .run(&files)
            .unwrap()
    }

    #[test]
    fn json_writer_emits_valid_json() {
        let report = sample_report();
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer).write_results(&report).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert!(parsed["groups"].is_array());
        assert!(parsed["suggestions"].is_array());
    }

    #[test]
    fn markdown_writer_includes_summary_and_groups() {
        let report = sample_report();
        let mut buffer = Vec::new();
        MarkdownWriter::new(&mut buffer)
            .write_results(&report)
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# Duplicate Pattern Report"));
        assert!(text.contains("| Duplicate groups |"));
        assert!(text.contains("## Refactoring Suggestions"));
    }
}
