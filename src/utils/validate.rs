use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static PLATFORM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]{2}$").expect("Invalid platform id regex"));

pub const TOPIC_MAX_CHARS: usize = 300;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 3..=32 个字符：字母、数字、下划线、点或连字符
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Username must be 3-32 characters of letters, digits, underscores, dots or hyphens",
        );
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 年级 1..=11
pub fn validate_school_class(class: i32) -> Result<(), &'static str> {
    if !(1..=11).contains(&class) {
        return Err("School class must be between 1 and 11");
    }
    Ok(())
}

/// 跨实例同步用的三位数学号 100..=999
pub fn validate_platform_id(platform_id: &str) -> Result<(), &'static str> {
    if !PLATFORM_ID_RE.is_match(platform_id) {
        return Err("Platform ID must be a 3-digit number between 100 and 999");
    }
    Ok(())
}

/// 课时：30..=240 且为 30 的倍数
pub fn validate_lesson_duration(minutes: i32) -> Result<(), &'static str> {
    if !(30..=240).contains(&minutes) || minutes % 30 != 0 {
        return Err("Duration must be 30-240 minutes in steps of 30");
    }
    Ok(())
}

/// 去掉首尾空白，空串视为清空；超过长度上限报错
pub fn normalize_topic(topic: &str) -> Result<Option<String>, &'static str> {
    let trimmed = topic.trim();
    if trimmed.chars().count() > TOPIC_MAX_CHARS {
        return Err("Topic must be at most 300 characters");
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("ivan.petrov").is_ok());
        assert!(validate_username("t_1-x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("иван").is_err());
        assert!(validate_username("with space").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("tutor@example.ru").is_ok());
        assert!(validate_email("tutor@localhost").is_err());
        assert!(validate_email("no-at.example.ru").is_err());
    }

    #[test]
    fn test_school_class_bounds() {
        assert!(validate_school_class(1).is_ok());
        assert!(validate_school_class(11).is_ok());
        assert!(validate_school_class(0).is_err());
        assert!(validate_school_class(12).is_err());
    }

    #[test]
    fn test_platform_id() {
        assert!(validate_platform_id("100").is_ok());
        assert!(validate_platform_id("999").is_ok());
        assert!(validate_platform_id("099").is_err());
        assert!(validate_platform_id("1000").is_err());
        assert!(validate_platform_id("12a").is_err());
    }

    #[test]
    fn test_lesson_duration() {
        assert!(validate_lesson_duration(30).is_ok());
        assert!(validate_lesson_duration(240).is_ok());
        assert!(validate_lesson_duration(45).is_err());
        assert!(validate_lesson_duration(270).is_err());
        assert!(validate_lesson_duration(0).is_err());
    }

    #[test]
    fn test_normalize_topic() {
        assert_eq!(normalize_topic("  Дроби ").unwrap().as_deref(), Some("Дроби"));
        assert_eq!(normalize_topic("   ").unwrap(), None);
        assert!(normalize_topic(&"я".repeat(301)).is_err());
        assert!(normalize_topic(&"я".repeat(300)).is_ok());
    }
}
