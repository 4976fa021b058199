pub const MIN_AGE: u8 = 6;
pub const MAX_AGE: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    Younger,
    Middle,
    Older,
    Unbanded(u8),
}

impl AgeBand {
    pub fn for_age(age: u8) -> Self {
        match age {
            6..=10 => Self::Younger,
            11..=13 => Self::Middle,
            14..=17 => Self::Older,
            other => Self::Unbanded(other),
        }
    }

    pub fn tone_directive(self) -> String {
        match self {
            Self::Younger => "The user is in the 6-10 age group. Your response must be very simple, using kid-friendly language, be highly visual, and minimize text. Focus on imagination and fun. Explain concepts using simple analogies. Career descriptions should be 1 simple sentence.".to_string(),
            Self::Middle => "The user is in the 11-13 age group. Your response should be informative but not overly complicated. Balance fun with real-world connections. Use a slightly more mature but still engaging tone.".to_string(),
            Self::Older => "The user is in the 14-17 age group. Your response can be detailed and informative. Use a mature tone suitable for a teenager. Focus on concrete steps, skills, and real-world career information. Provide practical advice.".to_string(),
            Self::Unbanded(age) => format!(
                "The user is a child/teenager aged {age}. Tailor your response to be age-appropriate."
            ),
        }
    }

    pub fn theme(self) -> &'static str {
        match self {
            Self::Younger => "theme-younger",
            Self::Middle => "theme-middle",
            Self::Older => "theme-older",
            Self::Unbanded(_) => "theme-default",
        }
    }
}

pub fn is_supported_age(age: u8) -> bool {
    (MIN_AGE..=MAX_AGE).contains(&age)
}

#[cfg(test)]
mod tests {
    use super::{is_supported_age, AgeBand};

    #[test]
    fn bands_cover_boundaries() {
        assert_eq!(AgeBand::for_age(6), AgeBand::Younger);
        assert_eq!(AgeBand::for_age(10), AgeBand::Younger);
        assert_eq!(AgeBand::for_age(11), AgeBand::Middle);
        assert_eq!(AgeBand::for_age(13), AgeBand::Middle);
        assert_eq!(AgeBand::for_age(14), AgeBand::Older);
        assert_eq!(AgeBand::for_age(17), AgeBand::Older);
        assert_eq!(AgeBand::for_age(5), AgeBand::Unbanded(5));
        assert_eq!(AgeBand::for_age(18), AgeBand::Unbanded(18));
    }

    #[test]
    fn unbanded_directive_names_the_age() {
        assert!(AgeBand::for_age(21).tone_directive().contains("aged 21"));
        assert!(AgeBand::for_age(8).tone_directive().contains("6-10"));
        assert_eq!(AgeBand::for_age(21).theme(), "theme-default");
    }

    #[test]
    fn supported_age_range_is_inclusive() {
        assert!(!is_supported_age(5));
        assert!(is_supported_age(6));
        assert!(is_supported_age(17));
        assert!(!is_supported_age(18));
    }
}
