//! SMILES tokenizer.
//!
//! Produces a flat token stream; stereo annotations (`@`, `/`, `\`) and atom
//! maps are parsed so that annotated strings resolve, but they carry no
//! topological information and are dropped downstream.

use crate::error::{ReaccionError, Result};

use super::element::is_known_element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    Atom(AtomToken),
    Bond(BondToken),
    RingClosure {
        bond: Option<BondToken>,
        digit: u16,
        pos: usize,
    },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct AtomToken {
    pub symbol: String,
    pub is_aromatic: bool,
    /// Explicit hydrogen count; `Some` for bracket atoms (0 when omitted).
    pub hcount: Option<u8>,
    pub charge: i8,
    pub is_bracket: bool,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
    /// Directional single bond (`/` or `\`); topology-equivalent to Single.
    Directional,
}

/// Two-letter organic-subset symbols checked before one-letter ones.
const ORGANIC_TWO: &[&str] = &["Br", "Cl"];
const ORGANIC_ONE: &[char] = &['B', 'C', 'N', 'O', 'P', 'S', 'F', 'I'];
const ORGANIC_AROMATIC: &[char] = &['b', 'c', 'n', 'o', 'p', 's'];

pub(super) fn tokenize(smiles: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = smiles.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => {
                i += 1;
            }
            '[' => {
                let (tok, next) = parse_bracket_atom(smiles, &chars, i)?;
                tokens.push(Token::Atom(tok));
                i = next;
            }
            '=' => {
                tokens.push(Token::Bond(BondToken::Double));
                i += 1;
            }
            '#' => {
                tokens.push(Token::Bond(BondToken::Triple));
                i += 1;
            }
            ':' => {
                tokens.push(Token::Bond(BondToken::Aromatic));
                i += 1;
            }
            '/' | '\\' => {
                tokens.push(Token::Bond(BondToken::Directional));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Bond(BondToken::Single));
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen(i));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot(i));
                i += 1;
            }
            '%' => {
                if i + 2 < chars.len()
                    && chars[i + 1].is_ascii_digit()
                    && chars[i + 2].is_ascii_digit()
                {
                    let digit =
                        (chars[i + 1] as u16 - '0' as u16) * 10 + (chars[i + 2] as u16 - '0' as u16);
                    let bond = take_pending_bond(&mut tokens);
                    tokens.push(Token::RingClosure {
                        bond,
                        digit,
                        pos: i,
                    });
                    i += 3;
                } else {
                    return Err(parse_error(smiles, i, "expected two digits after '%'"));
                }
            }
            d @ '0'..='9' => {
                let bond = take_pending_bond(&mut tokens);
                tokens.push(Token::RingClosure {
                    bond,
                    digit: d as u16 - '0' as u16,
                    pos: i,
                });
                i += 1;
            }
            _ => {
                if let Some((tok, next)) = parse_organic_atom(&chars, i) {
                    tokens.push(Token::Atom(tok));
                    i = next;
                } else {
                    return Err(parse_error(smiles, i, &format!("unexpected character {c:?}")));
                }
            }
        }
    }

    Ok(tokens)
}

fn parse_error(smiles: &str, position: usize, message: &str) -> ReaccionError {
    ReaccionError::StructureParse {
        smiles: smiles.to_string(),
        position,
        message: message.to_string(),
    }
}

fn take_pending_bond(tokens: &mut Vec<Token>) -> Option<BondToken> {
    if matches!(tokens.last(), Some(Token::Bond(_))) {
        if let Some(Token::Bond(b)) = tokens.pop() {
            return Some(b);
        }
    }
    None
}

fn parse_organic_atom(chars: &[char], i: usize) -> Option<(AtomToken, usize)> {
    for two in ORGANIC_TWO {
        let mut it = two.chars();
        let (a, b) = (it.next().unwrap(), it.next().unwrap());
        if chars[i] == a && chars.get(i + 1) == Some(&b) {
            return Some((bare_atom((*two).to_string(), false, i), i + 2));
        }
    }
    if ORGANIC_ONE.contains(&chars[i]) {
        return Some((bare_atom(chars[i].to_string(), false, i), i + 1));
    }
    if ORGANIC_AROMATIC.contains(&chars[i]) {
        let symbol = chars[i].to_ascii_uppercase().to_string();
        return Some((bare_atom(symbol, true, i), i + 1));
    }
    None
}

fn bare_atom(symbol: String, aromatic: bool, pos: usize) -> AtomToken {
    AtomToken {
        symbol,
        is_aromatic: aromatic,
        hcount: None,
        charge: 0,
        is_bracket: false,
        pos,
    }
}

fn parse_bracket_atom(smiles: &str, chars: &[char], start: usize) -> Result<(AtomToken, usize)> {
    let mut i = start + 1;

    // Isotope prefix, parsed and discarded.
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }

    let (symbol, is_aromatic) = parse_bracket_symbol(smiles, chars, &mut i, start)?;

    // Chirality tags, discarded.
    while i < chars.len() && chars[i] == '@' {
        i += 1;
    }

    let hcount = if i < chars.len() && chars[i] == 'H' {
        i += 1;
        if i < chars.len() && chars[i].is_ascii_digit() {
            let h = chars[i] as u8 - b'0';
            i += 1;
            h
        } else {
            1
        }
    } else {
        0
    };

    let charge = parse_charge(chars, &mut i);

    // Atom map (reaction mapping), discarded.
    if i < chars.len() && chars[i] == ':' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }

    if i >= chars.len() || chars[i] != ']' {
        return Err(parse_error(smiles, start, "unclosed bracket atom"));
    }

    Ok((
        AtomToken {
            symbol,
            is_aromatic,
            hcount: Some(hcount),
            charge,
            is_bracket: true,
            pos: start,
        },
        i + 1,
    ))
}

fn parse_bracket_symbol(
    smiles: &str,
    chars: &[char],
    i: &mut usize,
    bracket_start: usize,
) -> Result<(String, bool)> {
    if *i >= chars.len() {
        return Err(parse_error(smiles, bracket_start, "unclosed bracket atom"));
    }

    // Aromatic bracket symbols: se, te, and the single-letter set.
    for pat in ["se", "te"] {
        let sym: String = chars[*i..chars.len().min(*i + 2)].iter().collect();
        if sym == pat {
            *i += 2;
            let mut out = String::new();
            let mut cs = pat.chars();
            out.push(cs.next().unwrap().to_ascii_uppercase());
            out.push(cs.next().unwrap());
            return Ok((out, true));
        }
    }
    if ORGANIC_AROMATIC.contains(&chars[*i]) {
        let symbol = chars[*i].to_ascii_uppercase().to_string();
        *i += 1;
        return Ok((symbol, true));
    }

    // Two-letter element, then one-letter.
    if chars[*i].is_ascii_uppercase() {
        if *i + 1 < chars.len() && chars[*i + 1].is_ascii_lowercase() {
            let sym: String = chars[*i..=*i + 1].iter().collect();
            if is_known_element(&sym) {
                *i += 2;
                return Ok((sym, false));
            }
        }
        let sym = chars[*i].to_string();
        if is_known_element(&sym) {
            *i += 1;
            return Ok((sym, false));
        }
    }

    Err(parse_error(
        smiles,
        *i,
        &format!("unknown element symbol starting at {:?}", chars[*i]),
    ))
}

fn parse_charge(chars: &[char], i: &mut usize) -> i8 {
    let sign: i8 = match chars.get(*i) {
        Some('+') => 1,
        Some('-') => -1,
        _ => return 0,
    };
    *i += 1;
    // "+2" form
    if *i < chars.len() && chars[*i].is_ascii_digit() {
        let n = (chars[*i] as u8 - b'0') as i8;
        *i += 1;
        return sign * n;
    }
    // "++" form
    let mut magnitude: i8 = 1;
    while *i < chars.len() && ((sign > 0 && chars[*i] == '+') || (sign < 0 && chars[*i] == '-')) {
        magnitude += 1;
        *i += 1;
    }
    sign * magnitude
}
