//! Pattern extraction from parsed files.
//!
//! Walks each `ParsedFile` and emits `Pattern` candidates for free
//! functions, methods, class fields, and nested sub-blocks that meet the
//! configured size threshold. Extraction per file is independent and runs
//! on the rayon pool; results are merged and sorted by (file path, span)
//! so the universe order never depends on worker completion order.
//!
//! Malformed files fail with a per-file `Error::Extraction` that the run
//! reports as a warning; the remaining files are still analyzed.

use crate::config::DetectionConfig;
use crate::core::ast::{AstNode, ClassDecl, FieldDecl, FunctionDecl, NodeKind, ParsedFile, Span};
use crate::core::errors::{Error, Result};
use crate::core::{FileWarning, Pattern, PatternKind, PatternOwner, Token};
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use xxhash_rust::xxh64::Xxh64;

/// Seed for structural fingerprints. Fixed so fingerprints are stable
/// across runs and processes.
const FINGERPRINT_SEED: u64 = 0;

pub struct PatternExtractor<'a> {
    config: &'a DetectionConfig,
}

/// An emitted candidate plus its nesting depth, used to resolve same-span
/// conflicts (the innermost qualifying block wins).
struct Candidate {
    depth: usize,
    pattern: Pattern,
}

impl<'a> PatternExtractor<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Extract patterns from the whole corpus.
    ///
    /// Per-file failures do not abort the run; the failing file's patterns
    /// are omitted and a warning is returned instead.
    pub fn extract_all(&self, files: &[ParsedFile]) -> (Vec<Pattern>, Vec<FileWarning>) {
        let per_file: Vec<Result<Vec<Pattern>>> = if self.config.parallel {
            files.par_iter().map(|file| self.extract_file(file)).collect()
        } else {
            files.iter().map(|file| self.extract_file(file)).collect()
        };

        let mut patterns = Vec::new();
        let mut warnings = Vec::new();
        for (file, result) in files.iter().zip(per_file) {
            match result {
                Ok(mut extracted) => patterns.append(&mut extracted),
                Err(err) => {
                    warn!("skipping {}: {err}", file.path.display());
                    warnings.push(FileWarning {
                        file: file.path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        patterns.sort_by(|a, b| a.file.cmp(&b.file).then(a.span.cmp(&b.span)));
        debug!(
            "extracted {} patterns from {} files ({} skipped)",
            patterns.len(),
            files.len(),
            warnings.len()
        );
        (patterns, warnings)
    }

    /// Extract all candidate patterns from one file.
    pub fn extract_file(&self, file: &ParsedFile) -> Result<Vec<Pattern>> {
        let mut candidates = Vec::new();
        for function in &file.functions {
            self.extract_callable(
                &file.path,
                function,
                None,
                PatternKind::Function,
                &mut candidates,
            )?;
        }
        for class in &file.classes {
            validate_class(&file.path, class)?;
            for method in &class.methods {
                self.extract_callable(
                    &file.path,
                    method,
                    Some(&class.name),
                    PatternKind::Method,
                    &mut candidates,
                )?;
            }
            for field in &class.fields {
                validate_field(&file.path, field)?;
                candidates.push(Candidate {
                    depth: 0,
                    pattern: field_pattern(&file.path, &class.name, field),
                });
            }
        }

        let mut patterns = resolve_span_conflicts(candidates);
        patterns.sort_by(|a, b| a.span.cmp(&b.span));
        Ok(patterns)
    }

    fn extract_callable(
        &self,
        path: &Path,
        decl: &FunctionDecl,
        class: Option<&str>,
        kind: PatternKind,
        out: &mut Vec<Candidate>,
    ) -> Result<()> {
        validate_callable(path, decl)?;
        let owner = PatternOwner {
            name: decl.name.clone(),
            class: class.map(str::to_string),
        };

        let (tokens, node_count) = normalize_nodes(&decl.body);
        if node_count >= self.config.min_pattern_size {
            out.push(Candidate {
                depth: 0,
                pattern: build_pattern(
                    path,
                    decl.span,
                    kind,
                    owner.clone(),
                    decl.params.len(),
                    tokens,
                    node_count,
                ),
            });
        }

        for node in &decl.body {
            self.collect_blocks(path, node, &owner, 1, out);
        }
        Ok(())
    }

    /// Descend into a body and flag qualifying sub-blocks as candidates of
    /// their own, to catch duplication nested below the function level.
    fn collect_blocks(
        &self,
        path: &Path,
        node: &AstNode,
        owner: &PatternOwner,
        depth: usize,
        out: &mut Vec<Candidate>,
    ) {
        if node.kind.is_block_like() {
            let (tokens, node_count) = normalize_nodes(std::slice::from_ref(node));
            if node_count >= self.config.min_pattern_size {
                out.push(Candidate {
                    depth,
                    pattern: build_pattern(
                        path,
                        node.span,
                        PatternKind::Block,
                        owner.clone(),
                        0,
                        tokens,
                        node_count,
                    ),
                });
            }
        }
        for child in &node.children {
            self.collect_blocks(path, child, owner, depth + 1, out);
        }
    }
}

/// Two patterns from the same source span are never both emitted; the
/// innermost qualifying candidate wins. Candidates only reach this point
/// when they meet the size threshold, so depth alone decides.
fn resolve_span_conflicts(candidates: Vec<Candidate>) -> Vec<Pattern> {
    let mut by_span: HashMap<Span, Candidate> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        match by_span.get(&candidate.pattern.span) {
            Some(existing) if existing.depth >= candidate.depth => {}
            _ => {
                by_span.insert(candidate.pattern.span, candidate);
            }
        }
    }
    by_span.into_values().map(|c| c.pattern).collect()
}

fn build_pattern(
    path: &Path,
    span: Span,
    kind: PatternKind,
    owner: PatternOwner,
    param_count: usize,
    tokens: Vec<Token>,
    node_count: usize,
) -> Pattern {
    let fingerprint = fingerprint(&tokens);
    Pattern {
        file: path.to_path_buf(),
        span,
        kind,
        owner,
        param_count,
        line_span: span.line_count(),
        fingerprint,
        node_count,
        tokens,
    }
}

/// A class field as a tiny sub-pattern. Identifiers are normalized away
/// everywhere else, so the declared type and modifiers are what makes two
/// fields duplicates.
fn field_pattern(path: &Path, class: &str, field: &FieldDecl) -> Pattern {
    let type_word = field
        .field_type
        .clone()
        .unwrap_or_else(|| "untyped".to_string());
    let mut tokens = vec![Token::Word(type_word)];
    if field.is_static {
        tokens.push(Token::Word("static".to_string()));
    }
    if field.is_private {
        tokens.push(Token::Word("private".to_string()));
    }
    build_pattern(
        path,
        field.span,
        PatternKind::Field,
        PatternOwner {
            name: field.name.clone(),
            class: Some(class.to_string()),
        },
        0,
        tokens,
        1,
    )
}

/// Normalize a node forest into a token sequence.
///
/// Identifiers become positional placeholders keyed by first occurrence,
/// literal values are erased, and operator/callee choices are retained as
/// words. Returns the tokens and the number of AST nodes visited.
fn normalize_nodes(nodes: &[AstNode]) -> (Vec<Token>, usize) {
    let mut normalizer = Normalizer::default();
    for node in nodes {
        normalizer.visit(node);
    }
    (normalizer.tokens, normalizer.node_count)
}

#[derive(Default)]
struct Normalizer {
    placeholders: HashMap<String, u32>,
    tokens: Vec<Token>,
    node_count: usize,
}

impl Normalizer {
    fn visit(&mut self, node: &AstNode) {
        self.node_count += 1;
        match node.kind {
            NodeKind::Identifier => {
                let name = node.value.clone().unwrap_or_default();
                let next = self.placeholders.len() as u32;
                let index = *self.placeholders.entry(name).or_insert(next);
                self.tokens.push(Token::Ident(index));
            }
            NodeKind::Literal => self.tokens.push(Token::Lit),
            NodeKind::Call | NodeKind::BinaryOp | NodeKind::UnaryOp => {
                self.tokens.push(Token::Shape(node.kind));
                if let Some(value) = &node.value {
                    self.tokens.push(Token::Word(value.clone()));
                }
            }
            _ => self.tokens.push(Token::Shape(node.kind)),
        }
        for child in &node.children {
            self.visit(child);
        }
    }
}

/// Shape-only hash over the token kind sequence.
fn fingerprint(tokens: &[Token]) -> u64 {
    let mut hasher = Xxh64::new(FINGERPRINT_SEED);
    for token in tokens {
        hasher.update(token.kind().label().as_bytes());
        hasher.update(&[0xff]);
    }
    hasher.digest()
}

fn validate_callable(path: &Path, decl: &FunctionDecl) -> Result<()> {
    if decl.name.trim().is_empty() {
        return Err(Error::extraction(
            path,
            format!("unnamed function at line {}", decl.span.start_line),
        ));
    }
    if !decl.span.is_well_formed() {
        return Err(Error::extraction(
            path,
            format!("inverted span on function `{}`", decl.name),
        ));
    }
    for node in &decl.body {
        validate_node(path, &decl.name, node)?;
    }
    Ok(())
}

fn validate_node(path: &Path, owner: &str, node: &AstNode) -> Result<()> {
    if !node.span.is_well_formed() {
        return Err(Error::extraction(
            path,
            format!(
                "inverted span on {} node inside `{owner}`",
                node.kind.label()
            ),
        ));
    }
    for child in &node.children {
        validate_node(path, owner, child)?;
    }
    Ok(())
}

fn validate_class(path: &Path, class: &ClassDecl) -> Result<()> {
    if class.name.trim().is_empty() {
        return Err(Error::extraction(
            path,
            format!("unnamed class at line {}", class.span.start_line),
        ));
    }
    if !class.span.is_well_formed() {
        return Err(Error::extraction(
            path,
            format!("inverted span on class `{}`", class.name),
        ));
    }
    Ok(())
}

fn validate_field(path: &Path, field: &FieldDecl) -> Result<()> {
    if field.name.trim().is_empty() {
        return Err(Error::extraction(
            path,
            format!("unnamed field at line {}", field.span.start_line),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ast::{AstNode, NodeKind, Span};

    fn ident(name: &str, line: usize) -> AstNode {
        AstNode::new(NodeKind::Identifier, Span::lines(line, line)).with_value(name)
    }

    fn loop_body(acc: &str, item: &str, start: usize) -> Vec<AstNode> {
        vec![
            AstNode::new(NodeKind::Loop, Span::lines(start, start + 2)).with_children(vec![
                AstNode::new(NodeKind::Assign, Span::lines(start + 1, start + 1)).with_children(
                    vec![
                        ident(acc, start + 1),
                        AstNode::new(NodeKind::BinaryOp, Span::lines(start + 1, start + 1))
                            .with_value("+")
                            .with_children(vec![ident(acc, start + 1), ident(item, start + 1)]),
                    ],
                ),
            ]),
            AstNode::new(NodeKind::Return, Span::lines(start + 3, start + 3))
                .with_children(vec![ident(acc, start + 3)]),
        ]
    }

    fn function(name: &str, start: usize, end: usize, body: Vec<AstNode>) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            params: vec!["input".to_string()],
            is_async: false,
            return_type: None,
            span: Span::lines(start, end),
            body,
        }
    }

    fn file(path: &str, functions: Vec<FunctionDecl>) -> ParsedFile {
        ParsedFile {
            path: path.into(),
            functions,
            classes: Vec::new(),
        }
    }

    #[test]
    fn renamed_functions_share_tokens_and_fingerprint() {
        let config = DetectionConfig::default();
        let extractor = PatternExtractor::new(&config);

        let a = extractor
            .extract_file(&file("a.ts", vec![function("sum", 1, 4, loop_body("total", "x", 1))]))
            .unwrap();
        let b = extractor
            .extract_file(&file("b.ts", vec![function("add", 1, 4, loop_body("acc", "n", 1))]))
            .unwrap();

        let a_fn = a.iter().find(|p| p.kind == PatternKind::Function).unwrap();
        let b_fn = b.iter().find(|p| p.kind == PatternKind::Function).unwrap();
        assert_eq!(a_fn.tokens, b_fn.tokens);
        assert_eq!(a_fn.fingerprint, b_fn.fingerprint);
    }

    #[test]
    fn trivial_bodies_are_not_extracted() {
        let config = DetectionConfig::default();
        let extractor = PatternExtractor::new(&config);

        let tiny = function(
            "noop",
            1,
            1,
            vec![AstNode::new(NodeKind::Return, Span::lines(1, 1))],
        );
        let patterns = extractor.extract_file(&file("a.ts", vec![tiny])).unwrap();
        assert!(patterns.is_empty());
    }

    #[test]
    fn qualifying_nested_blocks_are_emitted_separately() {
        let config = DetectionConfig::default();
        let extractor = PatternExtractor::new(&config);

        let body = loop_body("total", "x", 2);
        let patterns = extractor
            .extract_file(&file("a.ts", vec![function("sum", 1, 6, body)]))
            .unwrap();

        let kinds: Vec<PatternKind> = patterns.iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&PatternKind::Function));
        assert!(kinds.contains(&PatternKind::Block), "loop block should be its own candidate");
    }

    #[test]
    fn same_span_conflict_keeps_innermost_block() {
        let config = DetectionConfig::default();
        let extractor = PatternExtractor::new(&config);

        // Function whose span equals its single block's span.
        let span = Span::lines(1, 5);
        let block = AstNode::new(NodeKind::Block, span).with_children(loop_body("t", "x", 2));
        let decl = FunctionDecl {
            name: "wrap".to_string(),
            params: Vec::new(),
            is_async: false,
            return_type: None,
            span,
            body: vec![block],
        };
        let patterns = extractor.extract_file(&file("a.ts", vec![decl])).unwrap();

        let at_span: Vec<&Pattern> = patterns.iter().filter(|p| p.span == span).collect();
        assert_eq!(at_span.len(), 1);
        assert_eq!(at_span[0].kind, PatternKind::Block);
    }

    #[test]
    fn malformed_file_becomes_warning_without_aborting() {
        let config = DetectionConfig::default();
        let extractor = PatternExtractor::new(&config);

        let bad = file("bad.ts", vec![function("", 1, 4, loop_body("t", "x", 1))]);
        let good = file("good.ts", vec![function("sum", 1, 4, loop_body("t", "x", 1))]);
        let (patterns, warnings) = extractor.extract_all(&[bad, good]);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].file, std::path::PathBuf::from("bad.ts"));
        assert!(patterns.iter().all(|p| p.file.ends_with("good.ts")));
        assert!(!patterns.is_empty());
    }

    #[test]
    fn universe_is_ordered_by_path_then_position() {
        let config = DetectionConfig::default();
        let extractor = PatternExtractor::new(&config);

        let files = vec![
            file("z.ts", vec![function("late", 1, 4, loop_body("t", "x", 1))]),
            file(
                "a.ts",
                vec![
                    function("second", 10, 13, loop_body("t", "x", 10)),
                    function("first", 1, 4, loop_body("t", "x", 1)),
                ],
            ),
        ];
        let (patterns, warnings) = extractor.extract_all(&files);
        assert!(warnings.is_empty());

        let keys: Vec<(std::path::PathBuf, Span)> = patterns
            .iter()
            .map(|p| (p.file.clone(), p.span))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
