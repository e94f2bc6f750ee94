//! Case/diacritic folding and the bilingual synonym table used by every
//! stage to canonicalize column names and category keys.

/// English terms mapped to the canonical Spanish vocabulary of the source
/// documents. Applied after folding; unknown terms pass through.
const SYNONYMS: &[(&str, &str)] = &[
    ("project", "proyecto"),
    ("location", "localizacion"),
    ("data source", "fuente de datos"),
    ("geolocation", "geolocalizacion"),
    ("interval", "intervalo"),
    ("movement", "movimiento"),
    ("person", "persona"),
];

/// Strip Spanish/Portuguese diacritics. The header vocabulary is fixed, so
/// an explicit table covers the full input alphabet.
pub fn fold_diacritics(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            'Ç' => 'C',
            _ => c,
        })
        .collect()
}

/// Canonical form of a column name or category key: folded, lowercased,
/// trimmed, with English synonyms replaced by the Spanish canonical term.
pub fn canonicalize(input: &str) -> String {
    let folded = fold_diacritics(input).to_lowercase();
    let trimmed = folded.trim();

    for (english, spanish) in SYNONYMS {
        if trimmed == *english {
            return (*spanish).to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold_diacritics("LOCALIZACIÓN"), "LOCALIZACION");
        assert_eq!(fold_diacritics("geolocalización"), "geolocalizacion");
        assert_eq!(fold_diacritics("año"), "ano");
        assert_eq!(fold_diacritics("plain"), "plain");
    }

    #[test]
    fn test_canonicalize_spanish_headers() {
        assert_eq!(canonicalize("  LOCALIZACIÓN "), "localizacion");
        assert_eq!(canonicalize("MOVIMIENTO"), "movimiento");
        assert_eq!(canonicalize("GEOLOCALIZACIÓN"), "geolocalizacion");
    }

    #[test]
    fn test_canonicalize_english_synonyms() {
        assert_eq!(canonicalize("Data Source"), "fuente de datos");
        assert_eq!(canonicalize("INTERVAL"), "intervalo");
        assert_eq!(canonicalize("Movement"), "movimiento");
        assert_eq!(canonicalize("Person"), "persona");
    }

    #[test]
    fn test_canonicalize_passthrough() {
        assert_eq!(canonicalize("TRICYCLE"), "tricycle");
        assert_eq!(canonicalize(" Motorcycle "), "motorcycle");
    }
}
