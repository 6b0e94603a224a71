// src/filter/privacy.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
// Specific formats first: card and SSN shapes would otherwise be eaten
// by the looser phone pattern.
static CREDIT_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{4}[ -]?){3}\d{3,4}\b").unwrap());
static SSN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{7,14}\d").unwrap());

/// Counts of detected sensitive sequences, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyMatches {
    pub emails: usize,
    pub phone_numbers: usize,
    pub credit_cards: usize,
    pub ssn_like: usize,
}

impl PrivacyMatches {
    pub fn total(&self) -> usize {
        self.emails + self.phone_numbers + self.credit_cards + self.ssn_like
    }
}

/// Detects and optionally masks personally identifying sequences.
///
/// Masking preserves the first two characters of an email's local part
/// and the full domain; every other match is replaced by a run of the
/// mask character equal in length to the match.
pub struct PrivacyFilter {
    mask_char: char,
}

impl Default for PrivacyFilter {
    fn default() -> Self {
        Self { mask_char: '*' }
    }
}

impl PrivacyFilter {
    pub fn new(mask_char: char) -> Self {
        Self { mask_char }
    }

    /// Count sensitive sequences without rewriting anything.
    pub fn detect(&self, text: &str) -> PrivacyMatches {
        // Mask progressively so the looser patterns never re-count a
        // sequence a stricter pattern already claimed.
        let mut working = text.to_string();
        let emails = EMAIL.find_iter(&working).count();
        working = EMAIL.replace_all(&working, "\u{0}").into_owned();
        let credit_cards = CREDIT_CARD.find_iter(&working).count();
        working = CREDIT_CARD.replace_all(&working, "\u{0}").into_owned();
        let ssn_like = SSN.find_iter(&working).count();
        working = SSN.replace_all(&working, "\u{0}").into_owned();
        let phone_numbers = PHONE.find_iter(&working).count();

        let matches = PrivacyMatches {
            emails,
            phone_numbers,
            credit_cards,
            ssn_like,
        };
        if matches.total() > 0 {
            debug!(
                "Detected sensitive data: {} emails, {} phones, {} cards, {} SSN-like",
                matches.emails, matches.phone_numbers, matches.credit_cards, matches.ssn_like
            );
        }
        matches
    }

    /// Mask all sensitive sequences, returning the rewritten text and
    /// match counts.
    pub fn mask(&self, text: &str) -> (String, PrivacyMatches) {
        let mut counts = PrivacyMatches::default();

        let masked = EMAIL
            .replace_all(text, |caps: &regex::Captures| {
                counts.emails += 1;
                self.mask_email(&caps[0])
            })
            .into_owned();

        let masked = CREDIT_CARD
            .replace_all(&masked, |caps: &regex::Captures| {
                counts.credit_cards += 1;
                self.mask_run(caps[0].len())
            })
            .into_owned();

        let masked = SSN
            .replace_all(&masked, |caps: &regex::Captures| {
                counts.ssn_like += 1;
                self.mask_run(caps[0].len())
            })
            .into_owned();

        let masked = PHONE
            .replace_all(&masked, |caps: &regex::Captures| {
                counts.phone_numbers += 1;
                self.mask_run(caps[0].len())
            })
            .into_owned();

        (masked, counts)
    }

    /// Keep the first two characters of the local part and the full
    /// domain: `jo****@example.com`.
    fn mask_email(&self, email: &str) -> String {
        match email.split_once('@') {
            Some((local, domain)) => {
                let keep: String = local.chars().take(2).collect();
                let hidden = local.chars().count().saturating_sub(keep.chars().count());
                format!(
                    "{}{}@{}",
                    keep,
                    self.mask_char.to_string().repeat(hidden),
                    domain
                )
            }
            None => self.mask_run(email.len()),
        }
    }

    fn mask_run(&self, len: usize) -> String {
        self.mask_char.to_string().repeat(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_mask_preserves_two_chars_and_domain() {
        let filter = PrivacyFilter::default();
        let (masked, counts) = filter.mask("contact john@example.com today");
        assert_eq!(masked, "contact jo**@example.com today");
        assert_eq!(counts.emails, 1);
    }

    #[test]
    fn long_local_part_masks_all_but_two() {
        let filter = PrivacyFilter::default();
        let (masked, _) = filter.mask("jonathan@example.com");
        assert_eq!(masked, "jo******@example.com");
    }

    #[test]
    fn short_local_part_never_panics() {
        let filter = PrivacyFilter::default();
        let (masked, counts) = filter.mask("j@example.com");
        assert_eq!(masked, "j@example.com");
        assert_eq!(counts.emails, 1);
    }

    #[test]
    fn card_mask_has_equal_length() {
        let filter = PrivacyFilter::default();
        let original = "4111 1111 1111 1111";
        let (masked, counts) = filter.mask(&format!("card: {}", original));
        assert_eq!(counts.credit_cards, 1);
        assert_eq!(masked, format!("card: {}", "*".repeat(original.len())));
    }

    #[test]
    fn ssn_is_masked_not_counted_as_phone() {
        let filter = PrivacyFilter::default();
        let (masked, counts) = filter.mask("ssn 123-45-6789 end");
        assert_eq!(counts.ssn_like, 1);
        assert_eq!(counts.phone_numbers, 0);
        assert!(masked.contains(&"*".repeat("123-45-6789".len())));
    }

    #[test]
    fn phone_numbers_are_masked() {
        let filter = PrivacyFilter::default();
        let (masked, counts) = filter.mask("call +1 555 867 5309 now");
        assert_eq!(counts.phone_numbers, 1);
        assert!(!masked.contains("5309"));
    }

    #[test]
    fn detect_counts_without_rewriting() {
        let filter = PrivacyFilter::default();
        let text = "a@b.org and 4111-1111-1111-1111 and 123-45-6789";
        let counts = filter.detect(text);
        assert_eq!(
            counts,
            PrivacyMatches {
                emails: 1,
                credit_cards: 1,
                ssn_like: 1,
                phone_numbers: 0,
            }
        );
    }

    #[test]
    fn clean_text_yields_zero_counts() {
        let filter = PrivacyFilter::default();
        assert_eq!(filter.detect("nothing sensitive here").total(), 0);
    }

    #[test]
    fn custom_mask_character_is_used() {
        let filter = PrivacyFilter::new('#');
        let (masked, _) = filter.mask("123-45-6789");
        assert_eq!(masked, "#".repeat(11));
    }
}
