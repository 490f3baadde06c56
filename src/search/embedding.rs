//! Text embedding backends
//!
//! The engine receives its embedder by injection, so a neural model can be
//! swapped in behind [`EmbeddingBackend`] without touching the retrieval code.
//!
//! [`HarmonicEmbedder`] is the built-in backend: Harmonic Token Projection
//! (<https://arxiv.org/html/2511.20665>), a deterministic, training-free
//! embedding that needs no model files.

use std::f64::consts::PI;

use crate::core::text::tokenize;
use crate::error::Result;

/// Output dimension of [`HarmonicEmbedder`] (two components per modulus).
/// Unrelated tokens correlate at roughly `1/sqrt(EMBEDDING_DIM)`, so the
/// dimension bounds how well a single shared term stands out.
pub const EMBEDDING_DIM: usize = 1024;

const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Tokens longer than this (in code points) are cut before projection
const MAX_TOKEN_LENGTH: usize = 64;

/// Code points are digits of the token integer in this base
const TOKEN_BASE: u64 = 65536;

/// Maps text to a fixed-size vector, at index build time and at query time
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Harmonic Token Projection embedder
#[derive(Debug, Clone)]
pub struct HarmonicEmbedder {
    moduli: Vec<u64>,
}

impl HarmonicEmbedder {
    pub fn new() -> Self {
        Self {
            moduli: first_primes(NUM_MODULI),
        }
    }

    /// Project one token onto the unit circle of every modulus:
    /// `[sin(2πr/m), cos(2πr/m)]` with `r = N mod m`
    fn project_token(&self, token: &str) -> Vec<f64> {
        let mut projection = Vec::with_capacity(EMBEDDING_DIM);
        for &m in &self.moduli {
            let theta = 2.0 * PI * (token_residue(token, m) as f64) / (m as f64);
            projection.push(theta.sin());
            projection.push(theta.cos());
        }
        projection
    }
}

impl Default for HarmonicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingBackend for HarmonicEmbedder {
    fn name(&self) -> &str {
        "harmonic-token-projection"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Mean of the token projections, L2-normalised. Text without tokens
    /// embeds to the zero vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(vec![0.0; EMBEDDING_DIM]);
        }

        let mut sum = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            for (acc, val) in sum.iter_mut().zip(self.project_token(token)) {
                *acc += val;
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum {
            *val /= count;
        }

        let norm = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        let scale = if norm > 0.0 { norm } else { 1.0 };
        Ok(sum.iter().map(|x| (*x / scale) as f32).collect())
    }
}

/// `N mod m` where `N` is the base-2^16 integer spelled by the token's code
/// points. Reduced digit by digit, so every character counts and no two
/// tokens collide through overflow.
fn token_residue(token: &str, m: u64) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |r, c| (r * TOKEN_BASE + c as u64) % m)
}

/// The first `n` primes; pairwise coprime moduli
fn first_primes(n: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
