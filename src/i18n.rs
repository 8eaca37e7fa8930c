// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）、英文、巴西葡萄牙语
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 3] = ["zh-CN", "en", "pt-BR"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" / "en" / "pt-BR"）
///
/// # 返回
/// - false: 不支持的语言（保持当前语言不变）
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale, "不支持的语言，保持当前设置");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use siv_site::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use siv_site::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/bom.xlsx")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 测试专用: rust-i18n 的 locale 为全局状态，涉及语言的测试需串行执行
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_default_locale() {
        let _guard = lock();
        set_locale("zh-CN");
        assert_eq!(current_locale(), "zh-CN");
    }

    #[test]
    fn test_set_locale() {
        let _guard = lock();
        assert!(set_locale("pt-BR"));
        assert_eq!(current_locale(), "pt-BR");

        assert!(!set_locale("fr"));
        assert_eq!(current_locale(), "pt-BR");

        set_locale("zh-CN");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = lock();
        set_locale("zh-CN");
        assert_eq!(t("common.success"), "操作成功");

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("zh-CN");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = lock();
        set_locale("en");
        let msg = t_with_args(
            "import.header_not_found",
            &[("sentinel", "ID"), ("limit", "30")],
        );
        assert!(msg.contains("\"ID\""));
        assert!(msg.contains("30"));

        set_locale("pt-BR");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/bom.xlsx")]);
        assert!(msg.contains("/tmp/bom.xlsx"));
        assert!(msg.contains("Arquivo não encontrado"));

        set_locale("zh-CN");
    }

    #[test]
    fn test_truncation_marker() {
        let _guard = lock();
        set_locale("zh-CN");
        assert_eq!(
            t_with_args("import.divergence_truncated", &[("remaining", "3")]),
            "... (+3)"
        );
    }
}
