//! 语言表
//!
//! 字幕服务支持的语言代码，以及标签名（如 "Japanese Language"）到代码的映射

/// 字幕服务支持的语言代码
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "ja", "pt", "ru", "fr", "de", "nl", "it"];

/// 语言名 -> 语言代码
pub const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Dutch", "nl"),
    ("Japanese", "ja"),
    ("Chinese", "zh"),
    ("Korean", "ko"),
    ("Arabic", "ar"),
];

const LANGUAGE_TAG_SUFFIX: &str = " Language";

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// 语言名查代码，大小写不敏感
pub fn code_for_name(name: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(_, code)| *code)
}

/// 语言代码查英文全名，如 "en" -> "English"
pub fn name_for_code(code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code.trim()))
        .map(|(name, _)| *name)
}

/// 标签名查代码：去掉 " Language" 后缀再查表
pub fn code_for_tag(tag_name: &str) -> Option<&'static str> {
    let name = tag_name.trim();
    let name = name.strip_suffix(LANGUAGE_TAG_SUFFIX).unwrap_or(name);
    code_for_name(name)
}
