// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 红线: 校验原因文本可本地化,类别 token 不变
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "zh-CN"];

/// 翻译消息（带参数,指定语言,不修改全局语言）
///
/// 不支持的语言回退到 "en"。
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let locale = if SUPPORTED_LOCALES.contains(&locale) {
        locale
    } else {
        "en"
    };
    fill_placeholders(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn fill_placeholders(mut message: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        message = message.replace(&placeholder, v);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_in_explicit_locale() {
        let msg = t_in("zh-CN", "validation.duplicate_identity_key", &[("key", "P-1-2-C-001")]);
        assert!(msg.contains("P-1-2-C-001"));
        assert!(msg.contains("重复"));

        let msg = t_in("fr", "validation.zero_quantity", &[]);
        assert_eq!(msg, "QTY is 0, row skipped");
    }

    #[test]
    fn test_t_in_fills_every_placeholder() {
        let msg = t_in(
            "en",
            "validation.invalid_quantity_too_large",
            &[("value", "1000"), ("max", "999")],
        );
        assert_eq!(msg, "QTY 1000 exceeds the maximum of 999 units per row");

        let msg = t_in("zh-CN", "import.file_not_found", &[("path", "/tmp/test.csv")]);
        assert_eq!(msg, "文件不存在: /tmp/test.csv");
    }
}
