//! Phase 2: collapse Phase 1 alternatives to a flat parsed-state stream.
//!
//! Each token with alternatives is resolved by a [`DisambiguationStrategy`].
//! Choosing a shorter reading leaves bytes that Phase 1 had folded into the
//! longer one; those bytes are re-scanned from the end of the chosen reading
//! until the stream lines up with a Phase 1 token boundary again.

use tangle_ir::View;
use tracing::trace;

use crate::scanner::PatternScanner;
use crate::token::{ParsedState, PatternToken};
use crate::PatternLexError;

/// How Phase 2 picks among a token's interpretations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisambiguationStrategy {
    /// The interpretation covering the most bytes. Ties keep the reading the
    /// scanner advanced past.
    #[default]
    LongestMatch,
    /// The interpretation covering the fewest bytes.
    ShortestMatch,
    /// The first recorded alternative, falling back to the primary reading.
    FirstListed,
}

impl DisambiguationStrategy {
    /// Pick one interpretation of `token`.
    pub fn choose<'t, 'a>(self, token: &'t PatternToken<'a>) -> &'t PatternToken<'a> {
        let candidates = std::iter::once(token).chain(token.alternatives.iter());
        match self {
            DisambiguationStrategy::LongestMatch => candidates
                .reduce(|best, t| if t.len() > best.len() { t } else { best })
                .unwrap_or(token),
            DisambiguationStrategy::ShortestMatch => candidates
                .reduce(|best, t| if t.len() < best.len() { t } else { best })
                .unwrap_or(token),
            DisambiguationStrategy::FirstListed => token.alternatives.first().unwrap_or(token),
        }
    }
}

/// Resolve every token to a single [`ParsedState`].
///
/// `pattern` must be the view `tokens` were scanned from; it is needed to
/// re-scan gaps left by shorter choices.
pub fn disambiguate<'a>(
    pattern: View<'a>,
    tokens: &[PatternToken<'a>],
    strategy: DisambiguationStrategy,
) -> Result<Vec<ParsedState<'a>>, PatternLexError> {
    let mut scanner = PatternScanner::new(pattern);
    let mut out = Vec::with_capacity(tokens.len());
    let mut pos = 0u32;
    let mut rescanned = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        if token.start < pos {
            // Swallowed by a re-scanned token that ran past this boundary.
            i += 1;
            continue;
        }
        if token.start > pos {
            pos = rescan_one(&mut scanner, pos, &mut out)?;
            rescanned += 1;
            continue;
        }
        let chosen = strategy.choose(token);
        out.push(ParsedState {
            kind: chosen.kind.clone(),
            text: chosen.text,
            start: chosen.start,
            ambiguous: token.is_ambiguous(),
        });
        pos = chosen.end();
        i += 1;
    }
    let len = pattern.len() as u32;
    while pos < len {
        pos = rescan_one(&mut scanner, pos, &mut out)?;
        rescanned += 1;
    }

    trace!(
        states = out.len(),
        rescanned,
        ?strategy,
        "pattern disambiguated"
    );
    Ok(out)
}

/// Scan one token at `pos` and append it. Returns the new position.
fn rescan_one<'a>(
    scanner: &mut PatternScanner<'a>,
    pos: u32,
    out: &mut Vec<ParsedState<'a>>,
) -> Result<u32, PatternLexError> {
    scanner.seek(pos);
    match scanner.next_token()? {
        Some(token) => {
            let end = token.end();
            let ambiguous = token.is_ambiguous();
            out.push(ParsedState {
                kind: token.kind,
                text: token.text,
                start: token.start,
                ambiguous,
            });
            Ok(end)
        }
        None => Ok(scanner.pos().max(pos + 1)),
    }
}

#[cfg(test)]
mod tests;
