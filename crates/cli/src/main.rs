use clap::{Parser, Subcommand};
use lrs_core::{
    datetime_ordered_desc, parse_culture_report, recent_observations_for_patient,
    results_grid_for_patient, LabError, LabTest, RelevantTests,
};
use lrs_store::FileLabTestStore;
use lrs_types::PatientId;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lrs")]
#[command(about = "Lab results summariser CLI")]
struct Cli {
    /// Root directory for stored lab data
    #[arg(long, default_value = "lab_data", global = true)]
    data_dir: PathBuf,
    /// YAML file mapping panels to wanted observations (defaults to the
    /// tuberculosis profile)
    #[arg(long, global = true)]
    relevant_tests: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a JSON array of lab tests for a patient
    Ingest {
        /// Patient identifier (hospital number)
        patient_id: String,
        /// Path to a JSON array of lab tests
        tests_file: PathBuf,
    },
    /// Print the most relevant result per configured observation
    Summary {
        /// Patient identifier (hospital number)
        patient_id: String,
    },
    /// Print the recent-results grid
    Grid {
        /// Patient identifier (hospital number)
        patient_id: String,
    },
    /// Parse and print the most recent culture report for an observation
    Culture {
        /// Patient identifier (hospital number)
        patient_id: String,
        /// Observation name, e.g. "TB: Culture Result"
        observation_name: String,
    },
    /// List stored patient ids
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lrs=info".parse()?)
                .add_directive("lrs_store=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = FileLabTestStore::new(&cli.data_dir);
    let relevant = match &cli.relevant_tests {
        Some(path) => RelevantTests::from_yaml_file(path)?,
        None => {
            tracing::debug!("no mapping file given, using the tuberculosis profile");
            RelevantTests::tb_summary()
        }
    };

    match cli.command {
        Commands::Ingest {
            patient_id,
            tests_file,
        } => {
            let patient = PatientId::parse(&patient_id)?;
            let contents = fs::read_to_string(&tests_file).map_err(LabError::FileRead)?;
            let tests: Vec<LabTest> =
                serde_json::from_str(&contents).map_err(LabError::Deserialization)?;
            let ingested = tests.len();
            let total = store.append_tests(&patient, tests)?;
            println!("Ingested {} lab tests for {} ({} stored)", ingested, patient, total);
        }
        Commands::Summary { patient_id } => {
            let patient = PatientId::parse(&patient_id)?;
            let summary = recent_observations_for_patient(&store, &patient, &relevant)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Grid { patient_id } => {
            let patient = PatientId::parse(&patient_id)?;
            let grid = results_grid_for_patient(&store, &patient, &relevant)?;
            println!("{}", serde_json::to_string_pretty(&grid)?);
        }
        Commands::Culture {
            patient_id,
            observation_name,
        } => {
            let patient = PatientId::parse(&patient_id)?;
            let mut tests = store.load_tests(&patient)?;
            tests.sort_by(datetime_ordered_desc);
            let observation = tests
                .iter()
                .flat_map(|test| test.observations.iter())
                .find(|obs| obs.observation_name == observation_name);
            match observation {
                Some(obs) => {
                    match obs.observation_value.as_deref().and_then(parse_culture_report) {
                        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                        None => {
                            println!("Most recent '{}' is not a culture report", observation_name)
                        }
                    }
                }
                None => println!("No '{}' observation found for {}", observation_name, patient),
            }
        }
        Commands::List => {
            let patients = store.list_patients();
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!("{}", patient);
                }
            }
        }
    }

    Ok(())
}
