pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::{CliConfig, Command, DutyArgs, SeatArgs};

#[cfg(feature = "cli")]
mod cli_args {
    use crate::core::duty::{DutyPolicy, SelectionPolicy, DEFAULT_MAX_DUTIES};
    use crate::core::ConfigProvider;
    use crate::domain::model::{DutyRequest, SeatRequest};
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::{Args, Parser, Subcommand};

    const INPUT_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

    #[derive(Debug, Clone, Parser)]
    #[command(name = "exam-duty")]
    #[command(about = "Exam seat allocation and invigilation duty scheduling")]
    pub struct CliConfig {
        #[arg(long, default_value = "./results", global = true)]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_value = "csv", global = true)]
        pub formats: Vec<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Split a block of USNs across classrooms (phase 1)
        Seats(SeatArgs),
        /// Assign invigilators to every exam slot and classroom (phase 2)
        Duties(DutyArgs),
    }

    #[derive(Debug, Clone, Args)]
    pub struct SeatArgs {
        #[arg(long)]
        pub students: u64,

        #[arg(long, help = "First USN of the block, e.g. 1MS20CS001")]
        pub start_usn: String,

        #[arg(long, help = "Classroom table with Classroom and Capacity columns")]
        pub classrooms: String,
    }

    #[derive(Debug, Clone, Args)]
    pub struct DutyArgs {
        #[arg(long)]
        pub exam_timetable: String,

        #[arg(long)]
        pub faculty_timetable: String,

        #[arg(long, help = "Seat allocation result; defaults to the one under --output-path")]
        pub allocation: Option<String>,

        #[arg(long, default_value_t = DEFAULT_MAX_DUTIES)]
        pub max_duties: u32,

        #[arg(long, default_value_t = SelectionPolicy::RosterOrder)]
        pub selection: SelectionPolicy,
    }

    impl ConfigProvider for CliConfig {
        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn duty_policy(&self) -> DutyPolicy {
            match &self.command {
                Command::Duties(args) => DutyPolicy {
                    max_duties: args.max_duties,
                    selection: args.selection,
                },
                Command::Seats(_) => DutyPolicy::default(),
            }
        }

        fn seat_request(&self) -> Option<SeatRequest> {
            match &self.command {
                Command::Seats(args) => Some(SeatRequest {
                    students: args.students,
                    start_usn: args.start_usn.clone(),
                    classrooms: args.classrooms.clone(),
                }),
                Command::Duties(_) => None,
            }
        }

        fn duty_request(&self) -> Option<DutyRequest> {
            match &self.command {
                Command::Duties(args) => Some(DutyRequest {
                    exam_timetable: args.exam_timetable.clone(),
                    faculty_timetable: args.faculty_timetable.clone(),
                    allocation: args.allocation.clone(),
                }),
                Command::Seats(_) => None,
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_output_formats("formats", &self.formats)?;

            match &self.command {
                Command::Seats(args) => {
                    validation::validate_non_empty_string("start_usn", &args.start_usn)?;
                    validation::validate_path("classrooms", &args.classrooms)?;
                    validation::validate_file_extensions(
                        "classrooms",
                        std::slice::from_ref(&args.classrooms),
                        &INPUT_EXTENSIONS,
                    )?;
                }
                Command::Duties(args) => {
                    let mut inputs =
                        vec![args.exam_timetable.clone(), args.faculty_timetable.clone()];
                    inputs.extend(args.allocation.iter().cloned());
                    for input in &inputs {
                        validation::validate_path("duties input", input)?;
                    }
                    validation::validate_file_extensions(
                        "duties input",
                        &inputs,
                        &INPUT_EXTENSIONS,
                    )?;
                    validation::validate_positive_number(
                        "max_duties",
                        args.max_duties as usize,
                        1,
                    )?;
                }
            }
            Ok(())
        }
    }

}
