//! 图标词表（46 个有序符号，下标即图标编号）

/// 词表大小；指纹下标按该值取模，因此词表必须稠密且不可变
pub const VOCABULARY_SIZE: usize = 46;

/// LessPass 指纹图标（按编号顺序）
///
/// 原始图标表在 3/45 与 31/33 处存在重复图标；这里 3 号改为 🏛️、33 号改为 🍵，
/// 保证每个编号都能由唯一符号表达，其余位置保持不变。
const LESSPASS_ICONS: [&str; VOCABULARY_SIZE] = [
    "#\u{FE0F}", "\u{2764}\u{FE0F}", "🏨", "🏛\u{FE0F}", "🔌",
    "🚑", "🚌", "🚗", "\u{2708}\u{FE0F}", "🚀",
    "🚢", "🚇", "🚚", "💴", "💶",
    "₿", "💵", "💷", "🗄\u{FE0F}", "📈",
    "🛏\u{FE0F}", "🍺", "🔔", "🔭", "🎂",
    "💣", "💼", "🐛", "📷", "🛒",
    "⭐", "☕", "\u{2601}\u{FE0F}", "🍵", "🗨\u{FE0F}",
    "📦", "🍴", "🖥\u{FE0F}", "💎", "❗",
    "👁\u{FE0F}", "🏁", "\u{2697}\u{FE0F}", "⚽", "🎮",
    "🎓",
];

/// 不可变词表。显式构造后按引用传入编解码与扫描流程，不使用全局状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    symbols: &'static [&'static str; VOCABULARY_SIZE],
}

impl Vocabulary {
    /// LessPass 使用的 46 图标词表
    pub fn lesspass() -> Self {
        Self { symbols: &LESSPASS_ICONS }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// 按编号取符号
    pub fn symbol(&self, index: usize) -> Option<&'static str> {
        self.symbols.get(index).copied()
    }

    /// 精确匹配查找符号编号
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.symbols.iter().position(|s| *s == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.symbols.iter().copied()
    }

    /// 词表列举模式：按固定分隔符拼接全部符号
    pub fn render(&self, delimiter: &str) -> String {
        self.symbols.join(delimiter)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::lesspass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn symbols_are_dense_and_distinct() {
        let vocab = Vocabulary::lesspass();
        assert_eq!(vocab.len(), VOCABULARY_SIZE);
        let distinct: HashSet<&str> = vocab.iter().collect();
        assert_eq!(distinct.len(), VOCABULARY_SIZE);
    }

    #[test]
    fn index_of_matches_position() {
        let vocab = Vocabulary::lesspass();
        for (i, s) in vocab.iter().enumerate() {
            assert_eq!(vocab.index_of(s), Some(i));
            assert_eq!(vocab.symbol(i), Some(s));
        }
        assert_eq!(vocab.symbol(VOCABULARY_SIZE), None);
    }

    #[test]
    fn index_of_is_exact() {
        let vocab = Vocabulary::lesspass();
        assert_eq!(vocab.index_of("₿"), Some(15));
        assert_eq!(vocab.index_of("#"), None);
        assert_eq!(vocab.index_of(" ₿"), None);
        assert_eq!(vocab.index_of(""), None);
    }

    #[test]
    fn render_joins_in_order() {
        let vocab = Vocabulary::lesspass();
        let listing = vocab.render("/");
        let parts: Vec<&str> = listing.split('/').collect();
        assert_eq!(parts.len(), VOCABULARY_SIZE);
        assert_eq!(parts[13], "💴");
        assert_eq!(parts[45], "🎓");
    }
}
