//! Brazilian tax documents (CPF for people, CNPJ for companies).
//!
//! Both carry two trailing mod-11 check digits. The accounting API rejects
//! structurally invalid documents, so buyers without a usable one get a
//! generated placeholder CPF instead.

use rand::Rng;

pub const CPF_LEN: usize = 11;
pub const CNPJ_LEN: usize = 14;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip everything but ASCII digits ("123.456.789-09" -> "12345678909").
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

fn to_digits(document: &str) -> Vec<u32> {
    document.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Mod-11 check digit over `digits` with the given weights.
fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 { 0 } else { 11 - rest }
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn cpf_check_digits(base: &[u32]) -> (u32, u32) {
    let first_weights: Vec<u32> = (2..=10).rev().collect();
    let first = check_digit(base, &first_weights);
    let mut extended = base.to_vec();
    extended.push(first);
    let second_weights: Vec<u32> = (2..=11).rev().collect();
    (first, check_digit(&extended, &second_weights))
}

/// True for an 11-digit CPF with valid check digits. Input must already be
/// digits only.
pub fn validate_cpf(document: &str) -> bool {
    if document.len() != CPF_LEN || !document.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits = to_digits(document);
    if all_same(&digits) {
        return false;
    }
    let (first, second) = cpf_check_digits(&digits[..9]);
    digits[9] == first && digits[10] == second
}

/// True for a 14-digit CNPJ with valid check digits. Input must already be
/// digits only.
pub fn validate_cnpj(document: &str) -> bool {
    if document.len() != CNPJ_LEN || !document.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits = to_digits(document);
    if all_same(&digits) {
        return false;
    }
    let first = check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS);
    let second = check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS);
    digits[12] == first && digits[13] == second
}

pub fn is_valid_document(document: &str) -> bool {
    validate_cpf(document) || validate_cnpj(document)
}

/// Generate a random, checksum-valid CPF.
pub fn generate_cpf() -> String {
    let mut rng = rand::thread_rng();
    let base: Vec<u32> = loop {
        let candidate: Vec<u32> = (0..9).map(|_| rng.gen_range(0..10)).collect();
        // Repeated-digit CPFs pass the checksum but are rejected as invalid.
        if !all_same(&candidate) {
            break candidate;
        }
    };
    let (first, second) = cpf_check_digits(&base);
    base.iter()
        .chain([first, second].iter())
        .map(|d| char::from_digit(*d, 10).unwrap_or('0'))
        .collect()
}

/// Keep a valid CPF/CNPJ (digits only); anything else becomes a generated CPF.
///
/// Returns the document and whether it was generated.
pub fn normalize_document(raw: Option<&str>) -> (String, bool) {
    match raw.map(digits_only) {
        Some(document) if is_valid_document(&document) => (document, false),
        _ => (generate_cpf(), true),
    }
}
