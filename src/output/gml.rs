//! GML export and import
//!
//! Writes the graph in the Graph Modelling Language layout that graph
//! toolkits read back: integer node ids with the language code as label,
//! and one repeated `articles` key per provenance entry on each edge.
//! `parse_gml` reads that layout back into a `LanguageGraph`.

use crate::graph::LanguageGraph;
use crate::output::traits::{GraphExporter, OutputError, OutputResult};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Write};
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

/// GML exporter
#[derive(Debug, Clone, Copy, Default)]
pub struct GmlExporter;

impl GraphExporter for GmlExporter {
    fn name(&self) -> &'static str {
        "GML"
    }

    fn render(&self, graph: &LanguageGraph) -> OutputResult<String> {
        format_gml(graph).map_err(|e| OutputError::Format(e.to_string()))
    }
}

/// Formats a language graph as GML
pub fn format_gml(graph: &LanguageGraph) -> Result<String, std::fmt::Error> {
    let mut gml = String::new();
    let mut ids = HashMap::new();

    writeln!(gml, "graph [")?;

    for (id, code) in graph.nodes().enumerate() {
        ids.insert(code, id);
        writeln!(gml, "  node [")?;
        writeln!(gml, "    id {}", id)?;
        writeln!(gml, "    label \"{}\"", escape(code))?;
        writeln!(gml, "  ]")?;
    }

    for (pair, edge) in graph.edges() {
        let (Some(source), Some(target)) = (ids.get(pair.first()), ids.get(pair.second())) else {
            continue;
        };
        writeln!(gml, "  edge [")?;
        writeln!(gml, "    source {}", source)?;
        writeln!(gml, "    target {}", target)?;
        writeln!(gml, "    weight {}", edge.weight())?;
        for article in edge.articles() {
            writeln!(gml, "    articles \"{}\"", escape(article))?;
        }
        writeln!(gml, "  ]")?;
    }

    writeln!(gml, "]")?;
    Ok(gml)
}

/// Escapes a GML string value
///
/// GML strings cannot contain a bare double quote; `&` and `"` become
/// character entities, and non-ASCII characters numeric ones.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            c => {
                let _ = write!(escaped, "&#{};", c as u32);
            }
        }
    }
    escaped
}

/// Reads a GML file written by `format_gml`
pub fn read_gml(path: &Path) -> OutputResult<LanguageGraph> {
    let text = std::fs::read_to_string(path)?;
    let graph = parse_gml(&text)?;

    tracing::info!(
        "Loaded graph ({} nodes, {} edges) from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

/// Parses GML text into a language graph
///
/// Nodes map integer ids to language-code labels. Every edge must carry at
/// least one `articles` entry, and its `weight`, when present, must equal
/// the number of distinct articles. Nodes that no edge touches are dropped,
/// and keys other than the ones above are ignored.
pub fn parse_gml(text: &str) -> OutputResult<LanguageGraph> {
    let document = GmlReader::new(text).read_document()?;

    let entries = document
        .into_iter()
        .find_map(|(key, value)| match (key.as_str(), value) {
            ("graph", GmlValue::List(entries)) => Some(entries),
            _ => None,
        })
        .ok_or_else(|| parse_error("no graph [ ... ] block"))?;

    let mut labels: HashMap<i64, String> = HashMap::new();
    let mut edges = Vec::new();

    for (key, value) in entries {
        match (key.as_str(), value) {
            ("node", GmlValue::List(fields)) => {
                let id = int_field(&fields, "node", "id")?;
                let label = str_field(&fields, "node", "label")?;
                if labels.insert(id, label.to_string()).is_some() {
                    return Err(parse_error(format!("duplicate node id {}", id)));
                }
            }
            ("edge", GmlValue::List(fields)) => edges.push(fields),
            _ => {}
        }
    }

    let mut graph = LanguageGraph::new();

    for fields in edges {
        let source = node_label(&labels, int_field(&fields, "edge", "source")?)?;
        let target = node_label(&labels, int_field(&fields, "edge", "target")?)?;
        if source == target {
            return Err(parse_error(format!("self-loop on {}", source)));
        }

        let articles: BTreeSet<&str> = fields
            .iter()
            .filter_map(|(key, value)| match (key.as_str(), value) {
                ("articles", GmlValue::Str(article)) => Some(article.as_str()),
                _ => None,
            })
            .collect();
        if articles.is_empty() {
            return Err(parse_error(format!(
                "edge {} - {} has no articles",
                source, target
            )));
        }

        if let Some(weight) = weight_field(&fields)? {
            if weight != articles.len() as u64 {
                return Err(parse_error(format!(
                    "edge {} - {} has weight {} but {} articles",
                    source,
                    target,
                    weight,
                    articles.len()
                )));
            }
        }

        let pair: BTreeSet<String> = [source.to_string(), target.to_string()].into();
        for article in articles {
            graph.record_cooccurrence(&pair, article);
        }
    }

    Ok(graph)
}

fn parse_error(message: impl fmt::Display) -> OutputError {
    OutputError::Parse(message.to_string())
}

/// A GML value: scalars or a bracketed list of key-value pairs
#[derive(Debug, Clone, PartialEq)]
enum GmlValue {
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<(String, GmlValue)>),
}

fn field<'a>(fields: &'a [(String, GmlValue)], key: &str) -> Option<&'a GmlValue> {
    fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn int_field(fields: &[(String, GmlValue)], block: &str, key: &str) -> OutputResult<i64> {
    match field(fields, key) {
        Some(GmlValue::Int(n)) => Ok(*n),
        Some(_) => Err(parse_error(format!("{} {} is not an integer", block, key))),
        None => Err(parse_error(format!("{} without {}", block, key))),
    }
}

fn str_field<'a>(fields: &'a [(String, GmlValue)], block: &str, key: &str) -> OutputResult<&'a str> {
    match field(fields, key) {
        Some(GmlValue::Str(s)) => Ok(s.as_str()),
        Some(_) => Err(parse_error(format!("{} {} is not a string", block, key))),
        None => Err(parse_error(format!("{} without {}", block, key))),
    }
}

/// Edge weight; other tools may write it as a real
fn weight_field(fields: &[(String, GmlValue)]) -> OutputResult<Option<u64>> {
    match field(fields, "weight") {
        None => Ok(None),
        Some(GmlValue::Int(n)) if *n >= 0 => Ok(Some(*n as u64)),
        Some(GmlValue::Real(w)) if *w >= 0.0 && w.fract() == 0.0 => Ok(Some(*w as u64)),
        Some(_) => Err(parse_error("edge weight is not a count")),
    }
}

fn node_label(labels: &HashMap<i64, String>, id: i64) -> OutputResult<&str> {
    labels
        .get(&id)
        .map(String::as_str)
        .ok_or_else(|| parse_error(format!("edge refers to unknown node {}", id)))
}

/// Character-level GML reader
struct GmlReader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> GmlReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl fmt::Display) -> OutputError {
        parse_error(format!("line {}: {}", self.line, message))
    }

    /// Top-level key-value pairs, up to end of input
    fn read_document(&mut self) -> OutputResult<Vec<(String, GmlValue)>> {
        self.read_list(false)
    }

    fn read_list(&mut self, nested: bool) -> OutputResult<Vec<(String, GmlValue)>> {
        let mut entries = Vec::new();
        loop {
            self.skip_blank();
            match self.chars.peek().copied() {
                None if nested => return Err(self.error("unclosed list")),
                None => return Ok(entries),
                Some(']') if nested => {
                    self.chars.next();
                    return Ok(entries);
                }
                Some(']') => return Err(self.error("unexpected ']'")),
                Some(_) => {}
            }

            let key = self.read_key()?;
            self.skip_blank();
            let value = self.read_value()?;
            entries.push((key, value));
        }
    }

    /// Skips whitespace and `#` comment lines
    fn skip_blank(&mut self) {
        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                '#' => {
                    while self.chars.next_if(|&c| c != '\n').is_some() {}
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                _ => break,
            }
        }
    }

    fn read_key(&mut self) -> OutputResult<String> {
        let mut key = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
            key.push(c);
        }

        match key.chars().next() {
            Some(first) if first.is_ascii_alphabetic() => Ok(key),
            _ => match self.chars.peek().copied() {
                Some(c) => Err(self.error(format!("expected a key, found '{}'", c))),
                None => Err(self.error("expected a key")),
            },
        }
    }

    fn read_value(&mut self) -> OutputResult<GmlValue> {
        match self.chars.peek().copied() {
            Some('[') => {
                self.chars.next();
                Ok(GmlValue::List(self.read_list(true)?))
            }
            Some('"') => {
                self.chars.next();
                self.read_string()
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.read_number(),
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
            None => Err(self.error("missing value")),
        }
    }

    fn read_string(&mut self) -> OutputResult<GmlValue> {
        let mut raw = String::new();
        loop {
            match self.chars.next() {
                Some('"') => break,
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    raw.push(c);
                }
                None => return Err(self.error("unterminated string")),
            }
        }
        unescape(&raw).map(GmlValue::Str).map_err(|e| self.error(e))
    }

    fn read_number(&mut self) -> OutputResult<GmlValue> {
        let mut text = String::new();
        while let Some(c) = self
            .chars
            .next_if(|c| c.is_ascii_digit() || matches!(*c, '-' | '+' | '.' | 'e' | 'E'))
        {
            text.push(c);
        }

        if let Ok(n) = text.parse::<i64>() {
            return Ok(GmlValue::Int(n));
        }
        text.parse::<f64>()
            .map(GmlValue::Real)
            .map_err(|_| self.error(format!("invalid number '{}'", text)))
    }
}

/// Reverses `escape`, plus the other named entities GML writers use
fn unescape(value: &str) -> Result<String, String> {
    let mut unescaped = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        unescaped.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let end = tail
            .find(';')
            .ok_or_else(|| format!("unterminated entity in \"{}\"", value))?;

        let entity = &tail[..end];
        let c = match entity {
            "amp" => '&',
            "quot" => '"',
            "lt" => '<',
            "gt" => '>',
            "apos" => '\'',
            _ => entity
                .strip_prefix('#')
                .and_then(|n| n.parse::<u32>().ok())
                .and_then(char::from_u32)
                .ok_or_else(|| format!("unknown entity &{};", entity))?,
        };
        unescaped.push(c);
        rest = &tail[end + 1..];
    }

    unescaped.push_str(rest);
    Ok(unescaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn sample_graph() -> LanguageGraph {
        let mut graph = LanguageGraph::new();
        graph.record_cooccurrence(&langs(&["en", "fr", "de"]), "Linguistics");
        graph.record_cooccurrence(&langs(&["en", "fr"]), "Grammar");
        graph
    }

    #[test]
    fn test_nodes_and_edges_present() {
        let gml = format_gml(&sample_graph()).unwrap();

        assert!(gml.starts_with("graph [\n"));
        assert!(gml.ends_with("]\n"));
        assert_eq!(gml.matches("  node [").count(), 3);
        assert_eq!(gml.matches("  edge [").count(), 3);
        assert!(gml.contains("    label \"de\"\n"));
        assert!(gml.contains("    label \"en\"\n"));
        assert!(gml.contains("    label \"fr\"\n"));
    }

    #[test]
    fn test_edge_weight_and_provenance() {
        let gml = format_gml(&sample_graph()).unwrap();

        // de=0, en=1, fr=2; (en, fr) is the last edge
        let en_fr = "  edge [\n    source 1\n    target 2\n    weight 2\n    articles \"Grammar\"\n    articles \"Linguistics\"\n  ]\n";
        assert!(gml.contains(en_fr), "{}", gml);
    }

    #[test]
    fn test_empty_graph() {
        let gml = format_gml(&LanguageGraph::new()).unwrap();
        assert_eq!(gml, "graph [\n]\n");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape("R&D"), "R&amp;D");
        assert_eq!(escape("Linguística"), "Lingu&#237;stica");
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.gml");

        GmlExporter.export(&sample_graph(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format_gml(&sample_graph()).unwrap());
    }

    #[test]
    fn test_written_graph_reads_back_equal() {
        let mut graph = sample_graph();
        graph.record_cooccurrence(&langs(&["zh,Hant", "x\"y", "en"]), "R&D \"quoted\"");
        graph.record_cooccurrence(&langs(&["pt", "es"]), "Linguística");

        let gml = format_gml(&graph).unwrap();
        assert_eq!(parse_gml(&gml).unwrap(), graph);
    }

    #[test]
    fn test_empty_graph_reads_back() {
        let gml = format_gml(&LanguageGraph::new()).unwrap();
        assert!(parse_gml(&gml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_tolerates_foreign_layout() {
        let gml = "# written elsewhere\nCreator \"tool\"\ngraph [ directed 0\n  node [ id 7 label \"en\" ]\n  node [ id 9 label \"fr\" x 1.5 ]\n  node [ id 11 label \"de\" ]\n  edge [ source 9 target 7 weight 2.0 articles \"A\" articles \"B\" ]\n]\n";

        let graph = parse_gml(gml).unwrap();
        assert_eq!(graph.weight("en", "fr"), 2);
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.contains_node("de"));
    }

    #[test]
    fn test_parse_rejects_inconsistent_edges() {
        let weight_mismatch = "graph [ node [ id 0 label \"en\" ] node [ id 1 label \"fr\" ] edge [ source 0 target 1 weight 3 articles \"A\" ] ]";
        let unknown_node = "graph [ node [ id 0 label \"en\" ] edge [ source 0 target 5 articles \"A\" ] ]";
        let no_articles = "graph [ node [ id 0 label \"en\" ] node [ id 1 label \"fr\" ] edge [ source 0 target 1 weight 1 ] ]";

        for text in [weight_mismatch, unknown_node, no_articles] {
            assert!(matches!(parse_gml(text), Err(OutputError::Parse(_))), "{}", text);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for text in [
            "graph [ node [ id 0 label \"en\" ]",
            "graph [ node [ id 0 label \"en ] ]",
            "graph [ node [ id 0 label \"&bogus;\" ] ]",
            "nodes only",
            "",
        ] {
            assert!(matches!(parse_gml(text), Err(OutputError::Parse(_))), "{:?}", text);
        }
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for value in ["plain", "say \"hi\"", "R&D", "Linguística", "中文"] {
            assert_eq!(unescape(&escape(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_read_gml_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.gml");
        GmlExporter.export(&sample_graph(), &path).unwrap();

        assert_eq!(read_gml(&path).unwrap(), sample_graph());
    }
}
