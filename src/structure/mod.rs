//! Molecule structure resolver.
//!
//! Derives a canonical atom ordering and bond topology from a SMILES string.
//! The ordering convention matches the one the QM descriptor tables were
//! generated with: heavy atoms in SMILES order first, then explicit hydrogens
//! appended in parent-atom order; bonds in encounter order (ring-closure
//! bonds at the closing digit), hydrogen bonds appended last.
//!
//! Resolution is deterministic: the same string always yields the same atom
//! ordering and bond list, which is what makes descriptor vectors indexed by
//! atom or bond position joinable across tables.
//!
//! # Example
//!
//! ```
//! use reaccion::structure::resolve;
//!
//! let mol = resolve("CO").unwrap();
//! assert_eq!(mol.heavy_atom_count(), 2);
//! // C, O, then 3 hydrogens on C and 1 on O
//! assert_eq!(mol.symbols(), vec!["C", "O", "H", "H", "H", "H"]);
//! assert_eq!(mol.bonds()[0], (0, 1));
//! ```

mod element;
mod tokenizer;

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{ReaccionError, Result};

use element::default_valences;
use tokenizer::{tokenize, AtomToken, BondToken, Token};

/// A resolved atom: element symbol plus the annotations that affect
/// hydrogen placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Element symbol, e.g. "C", "Cl", "H".
    pub symbol: String,
    /// Whether the atom was written lowercase (part of an aromatic system).
    pub is_aromatic: bool,
    /// Formal charge from the bracket annotation.
    pub charge: i8,
}

/// Bond topology classification. Directional SMILES bonds collapse to
/// `Single`; only connectivity matters for descriptor alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondKind {
    Single,
    Double,
    Triple,
    Aromatic,
}

/// A resolved molecular graph with explicit hydrogens.
#[derive(Debug, Clone)]
pub struct Molecule {
    graph: UnGraph<Atom, BondKind>,
    heavy_atom_count: usize,
}

impl Molecule {
    /// Total atom count including explicit hydrogens.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of non-hydrogen atoms (the prefix of the atom ordering).
    #[must_use]
    pub fn heavy_atom_count(&self) -> usize {
        self.heavy_atom_count
    }

    /// Total bond count including bonds to explicit hydrogens.
    #[must_use]
    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Element symbols in canonical atom order.
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].symbol.as_str())
            .collect()
    }

    /// Bond endpoint pairs in canonical bond order.
    #[must_use]
    pub fn bonds(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_indices()
            .map(|e| {
                let (a, b) = self
                    .graph
                    .edge_endpoints(e)
                    .expect("edge indices come from the graph itself");
                (a.index(), b.index())
            })
            .collect()
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &UnGraph<Atom, BondKind> {
        &self.graph
    }
}

/// Resolves a SMILES string into a [`Molecule`] with explicit hydrogens.
///
/// Supports the organic subset, bracket atoms (isotope, chirality, explicit
/// hydrogen count, charge, atom map), branches, ring closures (including
/// `%nn`), aromatic atoms, directional bonds, and `.`-joined components.
///
/// # Errors
///
/// Returns [`ReaccionError::StructureParse`] for any string that cannot be
/// resolved; the caller treats this as fatal for the record.
pub fn resolve(smiles: &str) -> Result<Molecule> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(parse_error(smiles, 0, "empty structure string"));
    }
    let tokens = tokenize(trimmed)?;

    let mut graph: UnGraph<Atom, BondKind> = UnGraph::default();
    let mut specs: Vec<AtomToken> = Vec::new();
    let mut prev: Option<NodeIndex> = None;
    let mut branch_stack: Vec<NodeIndex> = Vec::new();
    let mut pending_bond: Option<BondToken> = None;
    let mut ring_opens: HashMap<u16, (NodeIndex, Option<BondToken>, usize)> = HashMap::new();

    for token in &tokens {
        match token {
            Token::Atom(tok) => {
                let idx = graph.add_node(Atom {
                    symbol: tok.symbol.clone(),
                    is_aromatic: tok.is_aromatic,
                    charge: tok.charge,
                });
                specs.push(tok.clone());
                if let Some(p) = prev {
                    let kind = bond_kind(pending_bond.take(), &graph[p], &graph[idx]);
                    graph.add_edge(p, idx, kind);
                } else if pending_bond.take().is_some() {
                    return Err(parse_error(smiles, tok.pos, "bond with no preceding atom"));
                }
                prev = Some(idx);
            }
            Token::Bond(b) => {
                if pending_bond.is_some() {
                    return Err(parse_error(smiles, 0, "two consecutive bond symbols"));
                }
                pending_bond = Some(*b);
            }
            Token::RingClosure { bond, digit, pos } => {
                let cur = prev
                    .ok_or_else(|| parse_error(smiles, *pos, "ring closure with no preceding atom"))?;
                let closing_bond = bond.or(pending_bond.take());
                match ring_opens.remove(digit) {
                    Some((open_idx, open_bond, _)) => {
                        let kind = match (open_bond, closing_bond) {
                            (None, None) => None,
                            (Some(b), None) | (None, Some(b)) => Some(b),
                            (Some(a), Some(b)) if a == b => Some(a),
                            _ => {
                                return Err(parse_error(
                                    smiles,
                                    *pos,
                                    &format!("conflicting bond symbols for ring closure {digit}"),
                                ))
                            }
                        };
                        let kind = bond_kind(kind, &graph[open_idx], &graph[cur]);
                        graph.add_edge(open_idx, cur, kind);
                    }
                    None => {
                        ring_opens.insert(*digit, (cur, closing_bond, *pos));
                    }
                }
            }
            Token::OpenParen(pos) => {
                let root =
                    prev.ok_or_else(|| parse_error(smiles, *pos, "branch with no root atom"))?;
                branch_stack.push(root);
            }
            Token::CloseParen(pos) => {
                prev = Some(
                    branch_stack
                        .pop()
                        .ok_or_else(|| parse_error(smiles, *pos, "unmatched ')'"))?,
                );
            }
            Token::Dot(pos) => {
                if pending_bond.is_some() {
                    return Err(parse_error(smiles, *pos, "bond symbol before '.'"));
                }
                prev = None;
            }
        }
    }

    if pending_bond.is_some() {
        return Err(parse_error(smiles, trimmed.len(), "dangling bond symbol"));
    }
    if let Some((digit, (_, _, pos))) = ring_opens.iter().next() {
        return Err(parse_error(
            smiles,
            *pos,
            &format!("unclosed ring bond {digit}"),
        ));
    }
    if !branch_stack.is_empty() {
        return Err(parse_error(smiles, trimmed.len(), "unclosed branch"));
    }
    if graph.node_count() == 0 {
        return Err(parse_error(smiles, 0, "no atoms in structure string"));
    }

    add_explicit_hydrogens(&mut graph, &specs);

    Ok(Molecule {
        heavy_atom_count: specs.len(),
        graph,
    })
}

fn parse_error(smiles: &str, position: usize, message: &str) -> ReaccionError {
    ReaccionError::StructureParse {
        smiles: smiles.to_string(),
        position,
        message: message.to_string(),
    }
}

/// Resolves the bond kind between two atoms: an explicit symbol wins,
/// otherwise two aromatic atoms share an aromatic bond and anything else is
/// single.
fn bond_kind(token: Option<BondToken>, a: &Atom, b: &Atom) -> BondKind {
    match token {
        Some(BondToken::Single) | Some(BondToken::Directional) => BondKind::Single,
        Some(BondToken::Double) => BondKind::Double,
        Some(BondToken::Triple) => BondKind::Triple,
        Some(BondToken::Aromatic) => BondKind::Aromatic,
        None => {
            if a.is_aromatic && b.is_aromatic {
                BondKind::Aromatic
            } else {
                BondKind::Single
            }
        }
    }
}

/// Appends explicit hydrogens after all heavy atoms, one bond each appended
/// after all heavy bonds (the RDKit `AddHs` layout).
fn add_explicit_hydrogens(graph: &mut UnGraph<Atom, BondKind>, specs: &[AtomToken]) {
    let heavy: Vec<NodeIndex> = graph.node_indices().collect();
    for (idx, spec) in heavy.iter().zip(specs) {
        let h_count = match spec.hcount {
            // Bracket atoms carry their hydrogen count explicitly.
            Some(h) => h,
            None => implicit_hydrogens(graph, *idx, spec),
        };
        for _ in 0..h_count {
            let h = graph.add_node(Atom {
                symbol: "H".to_string(),
                is_aromatic: false,
                charge: 0,
            });
            graph.add_edge(*idx, h, BondKind::Single);
        }
    }
}

/// Implicit hydrogen count for a bare organic-subset atom: the smallest
/// default valence covering the bond order sum. Aromatic atoms reserve one
/// valence unit for the delocalized system (Daylight convention).
fn implicit_hydrogens(graph: &UnGraph<Atom, BondKind>, idx: NodeIndex, spec: &AtomToken) -> u8 {
    let bond_sum: u8 = graph
        .edges(idx)
        .map(|e| match e.weight() {
            BondKind::Single | BondKind::Aromatic => 1,
            BondKind::Double => 2,
            BondKind::Triple => 3,
        })
        .sum();
    let total = bond_sum + u8::from(spec.is_aromatic);
    default_valences(&spec.symbol)
        .iter()
        .find(|&&v| v >= total)
        .map_or(0, |&v| v - total)
}
