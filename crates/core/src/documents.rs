//! Brazilian document numbers: CPF, CNPJ, CEP and phone numbers
//!
//! Inputs are accepted masked (`529.982.247-25`) or bare (`52998224725`);
//! every check strips punctuation first.

/// Keep only ASCII digits
#[must_use]
pub fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn digits_of(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Validate a CPF (individual taxpayer id) by its two mod-11 check digits
#[must_use]
pub fn is_valid_cpf(value: &str) -> bool {
    let digits = digits_of(value);
    if digits.len() != 11 || all_equal(&digits) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let weight_start = u32::try_from(len).unwrap_or(0) + 1;
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - u32::try_from(i).unwrap_or(0)))
            .sum();
        match (sum * 10) % 11 {
            10 => 0,
            r => r,
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate a CNPJ (company taxpayer id) by its two weighted check digits
#[must_use]
pub fn is_valid_cnpj(value: &str) -> bool {
    let digits = digits_of(value);
    if digits.len() != 14 || all_equal(&digits) {
        return false;
    }

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            r if r < 2 => 0,
            r => 11 - r,
        }
    };

    check(&CNPJ_FIRST_WEIGHTS) == digits[12] && check(&CNPJ_SECOND_WEIGHTS) == digits[13]
}

/// Format a CPF as `000.000.000-00`
#[must_use]
pub fn format_cpf(value: &str) -> Option<String> {
    let d = only_digits(value);
    (d.len() == 11).then(|| format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]))
}

/// Format a CNPJ as `00.000.000/0000-00`
#[must_use]
pub fn format_cnpj(value: &str) -> Option<String> {
    let d = only_digits(value);
    (d.len() == 14).then(|| {
        format!(
            "{}.{}.{}/{}-{}",
            &d[..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..]
        )
    })
}

/// Reduce a CEP to its eight digits
#[must_use]
pub fn normalize_cep(value: &str) -> Option<String> {
    let d = only_digits(value);
    (d.len() == 8).then_some(d)
}

/// Format a CEP as `00000-000`
#[must_use]
pub fn format_cep(value: &str) -> Option<String> {
    normalize_cep(value).map(|d| format!("{}-{}", &d[..5], &d[5..]))
}

/// Format a phone number as `(99) 99999-9999` or `(99) 9999-9999`
#[must_use]
pub fn format_phone(value: &str) -> Option<String> {
    let d = only_digits(value);
    match d.len() {
        11 => Some(format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..])),
        10 => Some(format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_cpf() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("111.444.777-35"));
    }

    #[test]
    fn test_invalid_cpf() {
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234"));
        assert!(!is_valid_cpf(""));
    }

    #[test]
    fn test_valid_cnpj() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11222333000181"));
    }

    #[test]
    fn test_invalid_cnpj() {
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("00000000000000"));
        assert!(!is_valid_cnpj("11222333"));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_cpf("52998224725").as_deref(), Some("529.982.247-25"));
        assert_eq!(format_cnpj("11222333000181").as_deref(), Some("11.222.333/0001-81"));
        assert_eq!(format_cep("55292270").as_deref(), Some("55292-270"));
        assert_eq!(format_phone("87999998888").as_deref(), Some("(87) 99999-8888"));
        assert_eq!(format_phone("8737611111").as_deref(), Some("(87) 3761-1111"));
        assert!(format_cep("5529").is_none());
    }

    #[test]
    fn test_normalize_cep() {
        assert_eq!(normalize_cep("55292-270").as_deref(), Some("55292270"));
        assert_eq!(normalize_cep(" 55.292-270 ").as_deref(), Some("55292270"));
        assert!(normalize_cep("552922700").is_none());
    }

    proptest! {
        #[test]
        fn prop_cpf_single_digit_change_is_detected(pos in 0usize..11, delta in 1u32..10) {
            let mut digits: Vec<u32> = digits_of("52998224725");
            digits[pos] = (digits[pos] + delta) % 10;
            let mutated: String = digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect();
            prop_assert!(!is_valid_cpf(&mutated));
        }

        #[test]
        fn prop_mask_does_not_change_validity(raw in "[0-9]{11}") {
            let masked = format_cpf(&raw).unwrap();
            prop_assert_eq!(is_valid_cpf(&raw), is_valid_cpf(&masked));
        }
    }
}
