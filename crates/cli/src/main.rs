use api_shared::wire::{PatientRes, SearchParams};
use caretrack_core::constants::{
    DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_PATIENT_DATA_DIR,
};
use caretrack_core::{CoreConfig, Patient, PatientResult, PatientService, StoreBackend};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "caretrack")]
#[command(about = "CareTrack patient records CLI")]
struct Cli {
    /// Patient data directory
    #[arg(long, env = "PATIENT_DATA_DIR", default_value = DEFAULT_PATIENT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List {
        /// Only the patient with this exact identifier, e.g. PT1001
        #[arg(long)]
        patient_id: Option<String>,
    },
    /// Show one patient by record id
    Show {
        /// Record id (32 hex characters)
        id: String,
    },
    /// Filtered, sorted and paginated search
    Search {
        /// Substring of first name, last name or phone, or an exact record id
        #[arg(long)]
        search: Option<String>,
        /// Substring of a medical history condition
        #[arg(long)]
        condition: Option<String>,
        /// Substring of a visit date (YYYY-MM-DD)
        #[arg(long)]
        visit_date: Option<String>,
        #[arg(long)]
        sort_field: Option<String>,
        /// asc or desc
        #[arg(long)]
        sort_order: Option<String>,
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        page_size: Option<String>,
    },
    /// Print an aggregate report
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    PatientsPerCondition,
    MostPrescribedMedications,
    AverageAgePerDepartment,
    VisitsPerMonth,
    Demographics,
    Summary,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'caretrack --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::new(
        cli.data_dir,
        StoreBackend::File,
        DEFAULT_PAGE_SIZE,
        DEFAULT_MAX_PAGE_SIZE,
    )?;
    let service = PatientService::open(Arc::new(cfg))?;

    match run(&service, command) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {}", e),
    }

    Ok(())
}

fn run(service: &PatientService, command: Commands) -> PatientResult<String> {
    match command {
        Commands::List { patient_id } => {
            let patients = service.list_patients(patient_id.as_deref())?;
            Ok(to_json(&to_res(&patients)))
        }
        Commands::Show { id } => Ok(to_json(&service.get_patient(&id)?.to_res())),
        Commands::Search {
            search,
            condition,
            visit_date,
            sort_field,
            sort_order,
            page,
            page_size,
        } => {
            let page = service.advanced_search(SearchParams {
                search,
                condition,
                visit_date,
                sort_field,
                sort_order,
                page,
                page_size,
            })?;
            Ok(to_json(&page.to_res()))
        }
        Commands::Report { kind } => Ok(match kind {
            ReportKind::PatientsPerCondition => to_json(&service.patients_per_condition()?),
            ReportKind::MostPrescribedMedications => {
                to_json(&service.most_prescribed_medications()?)
            }
            ReportKind::AverageAgePerDepartment => {
                to_json(&service.average_age_per_department()?)
            }
            ReportKind::VisitsPerMonth => to_json(&service.visits_per_month()?),
            ReportKind::Demographics => to_json(&service.demographics()?),
            ReportKind::Summary => to_json(&service.summary()?),
        }),
    }
}

fn to_res(patients: &[Patient]) -> Vec<PatientRes> {
    patients.iter().map(Patient::to_res).collect()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
