//! IDN label conversion.
//!
//! Conversion is applied label by label so that host names which are not
//! strictly valid (underscores, spaces) pass through unchanged instead of
//! failing the whole conversion.

/// Converts between Unicode and ASCII-compatible (punycode) domain forms.
pub trait IdnCodec: Send + Sync {
    /// Encode a Unicode name to its ASCII-compatible form.
    ///
    /// Labels that are already ASCII are returned unchanged, case included;
    /// callers lowercase first when they need a canonical form.
    fn encode(&self, name: &str) -> String;

    /// Decode an ASCII-compatible name back to Unicode.
    fn decode(&self, name: &str) -> String;
}

const ACE_PREFIX: &str = "xn--";

/// IDNA 2008 codec backed by the `idna` crate (UTS-46, non-transitional).
#[derive(Debug, Clone, Copy, Default)]
pub struct Idna2008Codec;

impl Idna2008Codec {
    fn encode_label(label: &str) -> String {
        if label.is_ascii() {
            return label.to_string();
        }

        match idna::domain_to_ascii(label) {
            Ok(ascii) if !ascii.is_empty() => ascii,
            // Labels rejected by UTS-46 (spaces, symbols) still get a
            // reversible form.
            _ => match idna::punycode::encode_str(&label.to_lowercase()) {
                Some(encoded) => format!("{}{}", ACE_PREFIX, encoded),
                None => label.to_lowercase(),
            },
        }
    }

    fn decode_label(label: &str) -> String {
        let Some(encoded) = label
            .get(..ACE_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(ACE_PREFIX))
            .map(|_| &label[ACE_PREFIX.len()..])
        else {
            return label.to_string();
        };

        idna::punycode::decode_to_string(encoded).unwrap_or_else(|| label.to_string())
    }
}

impl IdnCodec for Idna2008Codec {
    fn encode(&self, name: &str) -> String {
        name.split('.')
            .map(Self::encode_label)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn decode(&self, name: &str) -> String {
        name.split('.')
            .map(Self::decode_label)
            .collect::<Vec<_>>()
            .join(".")
    }
}
