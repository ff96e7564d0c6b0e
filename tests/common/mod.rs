//! Synthetic mushroom tables for integration tests
//!
//! Rows follow the UCI layout (label `type` plus 22 categorical columns
//! with their original vocabularies). `bruises`, `gill-size` and
//! `stalk-shape` each agree with the label on 95% of rows; every other
//! column is noise.

#![allow(dead_code)]

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::{Path, PathBuf};

pub const N_ROWS: usize = 600;

const INDICATOR_ACCURACY: f64 = 0.95;

/// Column name, vocabulary, and for indicator columns the (edible, poisonous) values
const COLUMNS: [(&str, &[&str], Option<(&str, &str)>); 22] = [
    ("cap-shape", &["b", "c", "x", "f", "k", "s"], None),
    ("cap-surface", &["f", "g", "y", "s"], None),
    ("cap-color", &["n", "b", "c", "g", "r", "p", "u", "e", "w", "y"], None),
    ("bruises", &["t", "f"], Some(("t", "f"))),
    ("odor", &["a", "l", "c", "y", "f", "m", "n", "p", "s"], None),
    ("gill-attachment", &["a", "f"], None),
    ("gill-spacing", &["c", "w"], None),
    ("gill-size", &["b", "n"], Some(("b", "n"))),
    ("gill-color", &["k", "n", "b", "h", "g", "r", "o", "p", "u", "e", "w", "y"], None),
    ("stalk-shape", &["e", "t"], Some(("t", "e"))),
    ("stalk-root", &["b", "c", "e", "r", "?"], None),
    ("stalk-surface-above-ring", &["f", "y", "k", "s"], None),
    ("stalk-surface-below-ring", &["f", "y", "k", "s"], None),
    ("stalk-color-above-ring", &["n", "b", "c", "g", "o", "p", "e", "w", "y"], None),
    ("stalk-color-below-ring", &["n", "b", "c", "g", "o", "p", "e", "w", "y"], None),
    ("veil-type", &["p"], None),
    ("veil-color", &["n", "o", "w", "y"], None),
    ("ring-number", &["n", "o", "t"], None),
    ("ring-type", &["e", "f", "l", "n", "p"], None),
    ("spore-print-color", &["k", "n", "b", "h", "r", "o", "u", "w", "y"], None),
    ("population", &["a", "c", "n", "s", "v", "y"], None),
    ("habitat", &["g", "l", "m", "p", "u", "w", "d"], None),
];

/// Header names in file order
pub fn header() -> Vec<&'static str> {
    std::iter::once("type")
        .chain(COLUMNS.iter().map(|(name, _, _)| *name))
        .collect()
}

/// Full table as CSV text; identical for identical arguments
pub fn mushroom_csv(n_rows: usize, seed: u64) -> String {
    mushroom_csv_without(n_rows, seed, None)
}

/// Same table with one column left out
pub fn mushroom_csv_without(n_rows: usize, seed: u64, skip: Option<&str>) -> String {
    build_csv(n_rows, seed, skip, 0.5)
}

/// Full table where roughly `poisonous_share` of the rows are poisonous
pub fn mushroom_csv_with_share(n_rows: usize, seed: u64, poisonous_share: f64) -> String {
    build_csv(n_rows, seed, None, poisonous_share)
}

fn build_csv(n_rows: usize, seed: u64, skip: Option<&str>, poisonous_share: f64) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let keep: Vec<bool> = header().iter().map(|name| Some(*name) != skip).collect();

    let mut out = String::new();
    let names: Vec<&str> = header()
        .into_iter()
        .zip(&keep)
        .filter(|(_, keep)| **keep)
        .map(|(name, _)| name)
        .collect();
    out.push_str(&names.join(","));
    out.push('\n');

    for _ in 0..n_rows {
        let poisonous = rng.gen_bool(poisonous_share);
        let mut row = vec![if poisonous { "p" } else { "e" }];
        for (_, vocabulary, indicator) in COLUMNS.iter() {
            let value = match indicator {
                Some((edible, toxic)) => {
                    let agrees = rng.gen_bool(INDICATOR_ACCURACY);
                    if poisonous == agrees {
                        *toxic
                    } else {
                        *edible
                    }
                }
                None => vocabulary.choose(&mut rng).copied().unwrap_or("?"),
            };
            row.push(value);
        }
        let row: Vec<&str> = row
            .into_iter()
            .zip(&keep)
            .filter(|(_, keep)| **keep)
            .map(|(value, _)| value)
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Write the default table to `dir/mushrooms.csv`
pub fn write_mushroom_csv(dir: &Path) -> PathBuf {
    let path = dir.join("mushrooms.csv");
    fs::write(&path, mushroom_csv(N_ROWS, 7)).expect("Failed to write dataset");
    path
}
