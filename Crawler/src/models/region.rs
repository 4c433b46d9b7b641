// src/models/region.rs

//! Region registry: prefecture name to upstream region code.

/// Every prefecture the shop locator knows, in upstream code order.
pub const REGIONS: [(&str, &str); 47] = [
    ("北海道", "01"),
    ("青森県", "02"),
    ("岩手県", "03"),
    ("宮城県", "04"),
    ("秋田県", "05"),
    ("山形県", "06"),
    ("福島県", "07"),
    ("茨城県", "08"),
    ("栃木県", "09"),
    ("群馬県", "10"),
    ("埼玉県", "11"),
    ("千葉県", "12"),
    ("東京都", "13"),
    ("神奈川県", "14"),
    ("新潟県", "15"),
    ("富山県", "16"),
    ("石川県", "17"),
    ("福井県", "18"),
    ("山梨県", "19"),
    ("長野県", "20"),
    ("岐阜県", "21"),
    ("静岡県", "22"),
    ("愛知県", "23"),
    ("三重県", "24"),
    ("滋賀県", "25"),
    ("京都府", "26"),
    ("大阪府", "27"),
    ("兵庫県", "28"),
    ("奈良県", "29"),
    ("和歌山県", "30"),
    ("鳥取県", "31"),
    ("島根県", "32"),
    ("岡山県", "33"),
    ("広島県", "34"),
    ("山口県", "35"),
    ("徳島県", "36"),
    ("香川県", "37"),
    ("愛媛県", "38"),
    ("高知県", "39"),
    ("福岡県", "40"),
    ("佐賀県", "41"),
    ("長崎県", "42"),
    ("熊本県", "43"),
    ("大分県", "44"),
    ("宮崎県", "45"),
    ("鹿児島県", "46"),
    ("沖縄県", "47"),
];

/// Resolve an exact region name to its two-digit code.
pub fn resolve(name: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(region, _)| *region == name)
        .map(|(_, code)| *code)
}

/// Find the first registered name containing `fragment` (case-sensitive).
///
/// Used when subscribers type a shortened name such as `東京`.
pub fn find_containing(fragment: &str) -> Option<&'static str> {
    if fragment.is_empty() {
        return None;
    }
    REGIONS
        .iter()
        .find(|(region, _)| region.contains(fragment))
        .map(|(region, _)| *region)
}

/// Iterate over all registered region names.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGIONS.iter().map(|(region, _)| *region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_registered_name() {
        for (index, (name, code)) in REGIONS.iter().enumerate() {
            assert_eq!(resolve(name), Some(*code));
            assert_eq!(code.parse::<usize>().unwrap(), index + 1);
        }
    }

    #[test]
    fn resolves_tokyo() {
        assert_eq!(resolve("東京都"), Some("13"));
    }

    #[test]
    fn rejects_unregistered_names() {
        assert_eq!(resolve("東京"), None);
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("Tokyo"), None);
        assert_eq!(resolve(" 東京都"), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        assert_eq!(resolve("沖縄県"), resolve("沖縄県"));
    }

    #[test]
    fn finds_by_fragment() {
        assert_eq!(find_containing("東京"), Some("東京都"));
        assert_eq!(find_containing("大阪"), Some("大阪府"));
        assert_eq!(find_containing("北海道"), Some("北海道"));
        assert_eq!(find_containing("火星"), None);
        assert_eq!(find_containing(""), None);
    }

    #[test]
    fn fragment_match_takes_registry_order() {
        // "県" appears in many names; the first one wins.
        assert_eq!(find_containing("県"), Some("青森県"));
    }

    #[test]
    fn names_cover_registry() {
        assert_eq!(names().count(), 47);
    }
}
