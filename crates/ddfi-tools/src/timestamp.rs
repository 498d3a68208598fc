//! # 会话文件命名
//!
//! 每个采集会话创建一个新文件，以会话开始的本地时间命名：
//! `dd-mm-yy_HH-MM-SS.log`

use chrono::NaiveDateTime;

/// 会话文件名的时间格式（不含扩展名）
pub const SESSION_FILE_FORMAT: &str = "%d-%m-%y_%H-%M-%S";

/// 会话文件扩展名
pub const SESSION_FILE_EXTENSION: &str = "log";

/// 根据会话开始时间生成文件名
pub fn session_file_name(session_start: &NaiveDateTime) -> String {
    format!(
        "{}.{}",
        session_start.format(SESSION_FILE_FORMAT),
        SESSION_FILE_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 4)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap()
    }

    #[test]
    fn test_session_file_name() {
        assert_eq!(session_file_name(&sample_time()), "04-07-24_09-05-30.log");
    }

    #[test]
    fn test_session_file_name_sorts_within_a_day() {
        let later = sample_time() + chrono::Duration::seconds(1);
        assert_eq!(session_file_name(&later), "04-07-24_09-05-31.log");
        assert!(session_file_name(&sample_time()) < session_file_name(&later));
    }
}
