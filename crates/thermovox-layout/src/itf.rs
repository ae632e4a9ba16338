//! Interconnect technology file (ITF) reader.
//!
//! Only `CONDUCTOR <name> { ... }` blocks are used. Each becomes a metal
//! layer whose thickness comes from `THICKNESS=` and whose thermal
//! conductivity is looked up from the conductor name. Other blocks and
//! top-level assignments are skipped. `$` starts a comment.
//!
//! ITF files describe the back end only, so the result is framed by an
//! implicit silicon die on top and bump, substrate and board layers below.

use std::path::Path;

use log::{debug, info};

use crate::error::{LayoutError, Result};
use crate::stackup::{LayerKind, StackLayer};

/// Conductor thickness (µm) when a block has no `THICKNESS`.
pub const DEFAULT_CONDUCTOR_THICKNESS: f64 = 0.1;

/// Conductivity (W/m·K) of a conductor with an unrecognized material.
pub const DEFAULT_METAL_CONDUCTIVITY: f64 = 200.0;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Equals,
    LBrace,
    RBrace,
    Eof,
}

#[derive(Debug, Clone)]
struct SpannedToken {
    token: Token,
    line: usize,
}

fn tokenize(src: &str) -> Vec<SpannedToken> {
    let mut tokens = Vec::new();
    for (i, raw) in src.lines().enumerate() {
        let line = i + 1;
        let text = raw.split('$').next().unwrap_or("");
        let mut word = String::new();
        for c in text.chars() {
            let punct = match c {
                '=' => Some(Token::Equals),
                '{' => Some(Token::LBrace),
                '}' => Some(Token::RBrace),
                _ => None,
            };
            if punct.is_some() || c.is_whitespace() {
                if !word.is_empty() {
                    tokens.push(SpannedToken {
                        token: Token::Word(std::mem::take(&mut word)),
                        line,
                    });
                }
                if let Some(token) = punct {
                    tokens.push(SpannedToken { token, line });
                }
            } else {
                word.push(c);
            }
        }
        if !word.is_empty() {
            tokens.push(SpannedToken {
                token: Token::Word(word),
                line,
            });
        }
    }
    let last = tokens.last().map_or(1, |t| t.line);
    tokens.push(SpannedToken {
        token: Token::Eof,
        line: last,
    });
    tokens
}

/// A metal layer read from a `CONDUCTOR` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ItfConductor {
    pub name: String,
    /// Thickness (µm).
    pub thickness_um: f64,
}

impl ItfConductor {
    /// Thermal conductivity inferred from the conductor name.
    pub fn conductivity(&self) -> f64 {
        let name = &self.name;
        if name.contains("Ru") {
            100.0
        } else if name.contains("Al") {
            235.0
        } else if name.contains("Cu") || name.contains("Copper") {
            400.0
        } else {
            DEFAULT_METAL_CONDUCTIVITY
        }
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Self {
            tokens: tokenize(src),
            pos: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map_or(&Token::Eof, |t| &t.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if *self.peek() != expected {
            return Err(LayoutError::Parse {
                line: self.line(),
                message: format!("expected {what}"),
            });
        }
        self.advance();
        Ok(())
    }

    fn parse(mut self) -> Result<Vec<ItfConductor>> {
        let mut conductors = Vec::new();
        loop {
            match self.peek().clone() {
                Token::Eof => break,
                Token::Word(w) if w.eq_ignore_ascii_case("CONDUCTOR") => {
                    self.advance();
                    conductors.push(self.parse_conductor()?);
                }
                Token::LBrace => self.skip_block()?,
                Token::RBrace => {
                    return Err(LayoutError::Parse {
                        line: self.line(),
                        message: "unmatched '}'".to_string(),
                    });
                }
                _ => self.advance(),
            }
        }
        Ok(conductors)
    }

    /// Parse `<name> { KEY=VALUE ... }` after the `CONDUCTOR` keyword.
    fn parse_conductor(&mut self) -> Result<ItfConductor> {
        let line = self.line();
        let name = match self.peek() {
            Token::Word(w) => w.clone(),
            _ => {
                return Err(LayoutError::Parse {
                    line,
                    message: "CONDUCTOR requires a name".to_string(),
                });
            }
        };
        self.advance();
        self.expect(Token::LBrace, "'{' after conductor name")?;

        let mut thickness_um = DEFAULT_CONDUCTOR_THICKNESS;
        loop {
            match self.peek().clone() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => {
                    return Err(LayoutError::Parse {
                        line,
                        message: format!("unterminated CONDUCTOR block '{name}'"),
                    });
                }
                Token::LBrace => self.skip_block()?,
                Token::Word(key) => {
                    self.advance();
                    if *self.peek() != Token::Equals {
                        continue;
                    }
                    self.advance();
                    let value_line = self.line();
                    let Token::Word(value) = self.peek().clone() else {
                        return Err(LayoutError::Parse {
                            line: value_line,
                            message: format!("missing value for {key}"),
                        });
                    };
                    self.advance();
                    if key.eq_ignore_ascii_case("THICKNESS") {
                        thickness_um = parse_thickness(&value, value_line)?;
                    }
                }
                Token::Equals => self.advance(),
            }
        }
        Ok(ItfConductor { name, thickness_um })
    }

    /// Skip a brace-delimited block, including nested blocks.
    fn skip_block(&mut self) -> Result<()> {
        let line = self.line();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                Token::Eof => {
                    return Err(LayoutError::Parse {
                        line,
                        message: "unterminated block".to_string(),
                    });
                }
                _ => {}
            }
            self.advance();
        }
    }
}

fn parse_thickness(value: &str, line: usize) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(t) if t.is_finite() && t > 0.0 => Ok(t),
        _ => Err(LayoutError::Parse {
            line,
            message: format!("invalid THICKNESS '{value}'"),
        }),
    }
}

/// Read every `CONDUCTOR` block in `src`.
pub fn parse_conductors(src: &str) -> Result<Vec<ItfConductor>> {
    Parser::new(src).parse()
}

/// Build a full stackup from ITF source text.
pub fn parse_itf(src: &str) -> Result<Vec<StackLayer>> {
    let conductors = parse_conductors(src)?;
    debug!("ITF: {} conductor layers", conductors.len());

    let mut stack = Vec::with_capacity(conductors.len() + 4);
    stack.push(StackLayer::new("Active_Silicon", LayerKind::Die, 50.0, 150.0));
    stack.extend(conductors.iter().map(|c| {
        StackLayer::new(c.name.clone(), LayerKind::Metal, c.thickness_um, c.conductivity())
    }));
    stack.push(StackLayer::new("C4_Bump", LayerKind::Bump, 50.0, 60.0));
    stack.push(StackLayer::new("Substrate", LayerKind::Package, 500.0, 20.0));
    stack.push(StackLayer::new("PCB", LayerKind::Board, 1000.0, 0.5));
    Ok(stack)
}

/// Read an ITF file into a full stackup.
pub fn load_itf(path: impl AsRef<Path>) -> Result<Vec<StackLayer>> {
    let path = path.as_ref();
    info!("reading technology file {}", path.display());
    let src = std::fs::read_to_string(path)?;
    parse_itf(&src)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
TECHNOLOGY = demo_n7
GLOBAL_TEMPERATURE = 25.0

DIELECTRIC ILD1 { THICKNESS=0.05 ER=2.9 }

$ lower metals
CONDUCTOR M1_Cu { THICKNESS=0.036 WMIN=0.02 SMIN=0.02
    RESISTIVITY=0.022 }
CONDUCTOR M2_Ru {THICKNESS=0.04}
CONDUCTOR AP_Al { THICKNESS = 2.8 }
CONDUCTOR Mx { WMIN=0.1 }
"#;

    #[test]
    fn test_parse_conductors() {
        let conductors = parse_conductors(SAMPLE).unwrap();
        let names: Vec<&str> = conductors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["M1_Cu", "M2_Ru", "AP_Al", "Mx"]);
        assert_eq!(conductors[0].thickness_um, 0.036);
        assert_eq!(conductors[2].thickness_um, 2.8);
        assert_eq!(conductors[3].thickness_um, DEFAULT_CONDUCTOR_THICKNESS);
    }

    #[test]
    fn test_conductivity_by_material() {
        let conductors = parse_conductors(SAMPLE).unwrap();
        let k: Vec<f64> = conductors.iter().map(ItfConductor::conductivity).collect();
        assert_eq!(k, [400.0, 100.0, 235.0, DEFAULT_METAL_CONDUCTIVITY]);
    }

    #[test]
    fn test_stack_is_framed() {
        let stack = parse_itf(SAMPLE).unwrap();
        assert_eq!(stack.len(), 8);
        assert_eq!(stack[0].kind, LayerKind::Die);
        assert!(stack[1..5].iter().all(|l| l.kind == LayerKind::Metal));
        assert_eq!(stack[7].kind, LayerKind::Board);
    }

    #[test]
    fn test_empty_file_gives_frame_only() {
        let stack = parse_itf("$ nothing here\n").unwrap();
        assert_eq!(stack.len(), 4);
    }

    #[test]
    fn test_unterminated_block_reports_line() {
        let err = parse_conductors("\n\nCONDUCTOR M1 { THICKNESS=0.1\n").unwrap_err();
        assert!(matches!(err, LayoutError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_bad_thickness() {
        let err = parse_conductors("CONDUCTOR M1 { THICKNESS=abc }").unwrap_err();
        assert!(matches!(err, LayoutError::Parse { line: 1, .. }));
        assert!(parse_conductors("CONDUCTOR M1 { THICKNESS=-1 }").is_err());
    }

    #[test]
    fn test_missing_name() {
        assert!(matches!(
            parse_conductors("CONDUCTOR { }"),
            Err(LayoutError::Parse { .. })
        ));
    }
}
