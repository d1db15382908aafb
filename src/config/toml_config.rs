use crate::core::duty::{DutyPolicy, SelectionPolicy, DEFAULT_MAX_DUTIES};
use crate::core::ConfigProvider;
use crate::domain::model::{DutyRequest, SeatRequest};
use crate::utils::error::{AllocError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const INPUT_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: RunConfig,
    pub seating: Option<SeatingConfig>,
    pub duty: Option<DutyConfig>,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatingConfig {
    pub students: u64,
    pub start_usn: String,
    pub classrooms: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyConfig {
    pub exam_timetable: String,
    pub faculty_timetable: String,
    pub allocation: Option<String>,
    pub max_duties: Option<u32>,
    pub selection: Option<SelectionPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

fn default_formats() -> Vec<String> {
    vec!["csv".to_string()]
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AllocError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AllocError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EXAM_DATA_DIR})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AllocError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("run.name", &self.run.name)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_output_formats("output.formats", &self.output.formats)?;

        if self.seating.is_none() && self.duty.is_none() {
            return Err(AllocError::MissingConfigError {
                field: "seating or duty".to_string(),
            });
        }

        if let Some(seating) = &self.seating {
            validation::validate_non_empty_string("seating.start_usn", &seating.start_usn)?;
            validation::validate_path("seating.classrooms", &seating.classrooms)?;
            validation::validate_file_extensions(
                "seating.classrooms",
                std::slice::from_ref(&seating.classrooms),
                &INPUT_EXTENSIONS,
            )?;
        }

        if let Some(duty) = &self.duty {
            let mut inputs = vec![duty.exam_timetable.clone(), duty.faculty_timetable.clone()];
            inputs.extend(duty.allocation.iter().cloned());
            for input in &inputs {
                validation::validate_path("duty inputs", input)?;
            }
            validation::validate_file_extensions("duty inputs", &inputs, &INPUT_EXTENSIONS)?;

            if let Some(max_duties) = duty.max_duties {
                validation::validate_positive_number("duty.max_duties", max_duties as usize, 1)?;
            }
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn duty_policy(&self) -> DutyPolicy {
        match &self.duty {
            Some(duty) => DutyPolicy {
                max_duties: duty.max_duties.unwrap_or(DEFAULT_MAX_DUTIES),
                selection: duty.selection.unwrap_or_default(),
            },
            None => DutyPolicy::default(),
        }
    }

    fn seat_request(&self) -> Option<SeatRequest> {
        self.seating.as_ref().map(|s| SeatRequest {
            students: s.students,
            start_usn: s.start_usn.clone(),
            classrooms: s.classrooms.clone(),
        })
    }

    fn duty_request(&self) -> Option<DutyRequest> {
        self.duty.as_ref().map(|d| DutyRequest {
            exam_timetable: d.exam_timetable.clone(),
            faculty_timetable: d.faculty_timetable.clone(),
            allocation: d.allocation.clone(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[run]
name = "may-2024-exams"

[seating]
students = 50
start_usn = "1MS20CS001"
classrooms = "inputs/classrooms.csv"

[duty]
exam_timetable = "inputs/exams.csv"
faculty_timetable = "inputs/faculty.csv"
max_duties = 2
selection = "least-loaded"

[output]
path = "./results"
formats = ["csv", "json"]
"#;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.run.name, "may-2024-exams");
        assert!(config.validate().is_ok());
        assert_eq!(config.seat_request().unwrap().students, 50);
        assert_eq!(
            config.duty_policy(),
            DutyPolicy {
                max_duties: 2,
                selection: SelectionPolicy::LeastLoaded,
            }
        );
        assert_eq!(config.output_formats(), &["csv", "json"]);
    }

    #[test]
    fn test_duty_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[run]
name = "duties-only"

[duty]
exam_timetable = "exams.csv"
faculty_timetable = "faculty.csv"

[output]
path = "./results"
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.duty_policy(), DutyPolicy::default());
        assert_eq!(config.output_formats(), &["csv"]);
        assert!(config.seat_request().is_none());
        assert!(!config.verbose());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EXAM_DUTY_TEST_DIR", "/data/exams");

        let config = TomlConfig::from_toml_str(
            r#"
[run]
name = "env"

[seating]
students = 10
start_usn = "1MS20CS001"
classrooms = "${EXAM_DUTY_TEST_DIR}/classrooms.csv"

[output]
path = "${EXAM_DUTY_TEST_UNSET_VAR}"
"#,
        )
        .unwrap();

        assert_eq!(
            config.seating.as_ref().unwrap().classrooms,
            "/data/exams/classrooms.csv"
        );
        assert_eq!(config.output.path, "${EXAM_DUTY_TEST_UNSET_VAR}");

        std::env::remove_var("EXAM_DUTY_TEST_DIR");
    }

    #[test]
    fn test_config_validation() {
        let no_phase = TomlConfig::from_toml_str(
            r#"
[run]
name = "empty"

[output]
path = "./results"
"#,
        )
        .unwrap();
        assert!(matches!(
            no_phase.validate(),
            Err(AllocError::MissingConfigError { .. })
        ));

        let bad_format =
            TomlConfig::from_toml_str(&FULL_CONFIG.replace("\"json\"", "\"xlsx\"")).unwrap();
        assert!(bad_format.validate().is_err());

        assert!(TomlConfig::from_toml_str("[run]\nname = 3").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.run.name, "may-2024-exams");
    }
}
