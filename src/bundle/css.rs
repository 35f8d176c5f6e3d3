//! Structural check of generated CSS blocks using cssparser

use crate::utils::{CompatError, Result};
use cssparser::{BasicParseErrorKind, ParseError, Parser, ParserInput, Token};

/// Summary of a checked CSS block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    /// Curly-bracket blocks at any depth (at-rules and style rules)
    pub blocks: usize,
    /// `@supports` rules at the top level
    pub supports_rules: usize,
}

/// Tokenize a block and make sure every bracket is balanced
pub fn check_block(css: &str) -> Result<BlockStats> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut stats = BlockStats {
        blocks: 0,
        supports_rules: 0,
    };

    walk(&mut parser, &mut stats, true)
        .map_err(|e| CompatError::Config(format!("malformed CSS block: {:?}", e.kind)))?;
    Ok(stats)
}

fn walk<'i>(
    parser: &mut Parser<'i, '_>,
    stats: &mut BlockStats,
    top_level: bool,
) -> std::result::Result<(), ParseError<'i, ()>> {
    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };

        match token {
            Token::AtKeyword(ref name) if top_level && name.eq_ignore_ascii_case("supports") => {
                stats.supports_rules += 1;
            }
            Token::CurlyBracketBlock => {
                stats.blocks += 1;
                parser.parse_nested_block(|p| walk(p, stats, false))?;
            }
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                parser.parse_nested_block(|p| walk(p, stats, false))?;
            }
            Token::CloseCurlyBracket
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::BadUrl(_)
            | Token::BadString(_) => {
                return Err(parser.new_error(BasicParseErrorKind::UnexpectedToken(token)));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CssFallback;

    #[test]
    fn test_guarded_block_is_balanced() {
        let stats = check_block(&CssFallback::AspectRatio.guarded_block()).unwrap();
        assert_eq!(stats.supports_rules, 1);
        // The @supports block plus two style rules
        assert_eq!(stats.blocks, 3);
    }

    #[test]
    fn test_stray_close_bracket() {
        assert!(check_block(".a { color: red; } }").is_err());
    }

    #[test]
    fn test_nested_functions() {
        let stats = check_block(".glass { background-color: rgba(255, 255, 255, 0.92); }").unwrap();
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.supports_rules, 0);
    }
}
