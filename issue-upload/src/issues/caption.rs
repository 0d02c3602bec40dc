//! Column classification by caption prefix

/// Semantic role of an issue column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldTag {
    Ad,
    Bt,
    Sw,
    Date,
    Status,
}

impl FieldTag {
    /// All tags in classification order; the first matching prefix wins
    pub const ALL: [FieldTag; 5] = [
        FieldTag::Ad,
        FieldTag::Bt,
        FieldTag::Sw,
        FieldTag::Date,
        FieldTag::Status,
    ];

    /// Lower-case caption prefix selecting this tag
    pub fn prefix(self) -> &'static str {
        match self {
            FieldTag::Ad => "ad",
            FieldTag::Bt => "bt",
            FieldTag::Sw => "sw",
            FieldTag::Date => "date",
            FieldTag::Status => "status",
        }
    }

    /// Classify a caption, case-insensitively, by prefix
    ///
    /// `"AD_Text"`, `"ad-col"` and `"Ad"` are all [`FieldTag::Ad`];
    /// `"xAD"` is nothing.
    pub fn classify(caption: &str) -> Option<FieldTag> {
        let lower = caption.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| lower.starts_with(tag.prefix()))
    }
}

impl std::fmt::Display for FieldTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefix().to_uppercase())
    }
}

/// The caption row, classified once per run
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    captions: Vec<String>,
    /// Aligned to `captions`; index 0 (the key column) is always `None`
    tags: Vec<Option<FieldTag>>,
}

impl ColumnPlan {
    pub fn from_captions(captions: &[String]) -> Self {
        let tags = captions
            .iter()
            .enumerate()
            .map(|(idx, caption)| {
                if idx == 0 {
                    return None;
                }
                let tag = FieldTag::classify(caption);
                match tag {
                    Some(tag) => log::debug!("column {} '{}' -> {}", idx, caption, tag),
                    None => log::debug!("column {} '{}' ignored", idx, caption),
                }
                tag
            })
            .collect();

        Self {
            captions: captions.to_vec(),
            tags,
        }
    }

    /// Caption of the key column
    pub fn key_caption(&self) -> Option<&str> {
        self.captions.first().map(String::as_str)
    }

    /// Column index and tag of every classified column, in column order
    pub fn tagged(&self) -> impl Iterator<Item = (usize, FieldTag)> + '_ {
        self.tags
            .iter()
            .enumerate()
            .filter_map(|(idx, tag)| tag.map(|t| (idx, t)))
    }
}
