use crate::infra::{
    parse_currency, parse_date, parse_document_arg, InMemoryApplicationRepository,
    InMemoryDocumentRepository,
};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;
use dmw_portal::config::AppConfig;
use dmw_portal::error::AppError;
use dmw_portal::workflows::direct_hire::{
    ApplicationType, ChecklistCoordinator, ControlNumberGenerator, CoordinatorError,
    CoordinatorStep, Currency, DirectHireService, DirectHireSubmission, DocumentKind,
    ExchangeRates, GenerateOutcome, Milestone, MonetaryAmount, Notification, NotificationLevel,
    Notifier, PortalCollaborators, PortalGateway, SaveOutcome, Sex, UploadFile, UploadPolicy,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Worker name recorded on the application
    #[arg(long, default_value = "Maria Santos")]
    pub(crate) name: String,
    /// Position offered by the foreign employer
    #[arg(long, default_value = "Staff Nurse")]
    pub(crate) position: String,
    /// Foreign employer
    #[arg(long, default_value = "King Faisal Specialist Hospital")]
    pub(crate) employer: String,
    /// Job site (city, country)
    #[arg(long, default_value = "Riyadh, Saudi Arabia")]
    pub(crate) job_site: String,
    /// Monthly salary amount
    #[arg(long, default_value_t = 9500.0)]
    pub(crate) salary: f64,
    /// Salary currency code
    #[arg(long, default_value = "SAR", value_parser = parse_currency)]
    pub(crate) currency: Currency,
    /// Attach a real file, e.g. `--document passport=./passport.pdf`. Repeatable.
    #[arg(long = "document", value_parser = parse_document_arg)]
    pub(crate) documents: Vec<(DocumentKind, PathBuf)>,
    /// Only attach the files given with `--document`; skip placeholder PDFs.
    #[arg(long)]
    pub(crate) no_placeholders: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ControlNumberArgs {
    /// Filing date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Numbers already issued on the filing date
    #[arg(long, default_value_t = 0)]
    pub(crate) issued_today: u32,
    /// Numbers already issued this year
    #[arg(long, default_value_t = 0)]
    pub(crate) issued_this_year: u32,
    /// How many numbers to preview
    #[arg(long, default_value_t = 3)]
    pub(crate) count: u32,
}

#[derive(Args, Debug)]
pub(crate) struct ConvertArgs {
    /// Amount to convert
    pub(crate) amount: f64,
    /// Source currency code
    #[arg(value_parser = parse_currency)]
    pub(crate) from: Currency,
    /// Target currency code
    #[arg(long, default_value = "USD", value_parser = parse_currency)]
    pub(crate) to: Currency,
}

/// Prints coordinator notifications inline with the demo output.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        println!(
            "    [{tag}] {}: {}",
            notification.title, notification.message
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        name,
        position,
        employer,
        job_site,
        salary,
        currency,
        documents,
        no_placeholders,
    } = args;

    let config = AppConfig::load()?;
    let rates = ExchangeRates::from_config(&config.salary)?;
    let policy = UploadPolicy::from(&config.documents);
    let service = Arc::new(DirectHireService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryDocumentRepository::default()),
        policy,
    ));

    println!("Direct Hire processing demo");
    let submission = DirectHireSubmission {
        name,
        sex: Sex::Female,
        position,
        job_site,
        employer,
        salary: MonetaryAmount::new(salary, currency),
    };
    let application = service.create(submission)?;
    let usd = rates.to_usd(application.salary)?;
    println!(
        "- Filed {} for {} ({} at {})",
        application.control_number, application.name, application.position, application.employer
    );
    println!("  Declared salary: {} (~{})", application.salary, usd);

    let gateway = Arc::new(PortalGateway::new(service.clone()));
    let collaborators = PortalCollaborators::in_process(gateway, Arc::new(ConsoleNotifier));
    let mut coordinator = match ChecklistCoordinator::open(
        application.id.clone(),
        collaborators,
        policy,
    ) {
        Ok(coordinator) => coordinator,
        Err(err) => {
            println!("  Checklist unavailable: {}", err);
            return Ok(());
        }
    };

    println!("\nStatus checklist");
    if let Err(err) = coordinator.toggle(Milestone::EmailedToDhad, true) {
        println!("  Toggle rejected: {}", err);
    }
    report_save("  Save without confirmation", coordinator.save(false));
    report_save("  Save after confirmation", coordinator.save(true));
    if let Err(err) = coordinator.toggle(Milestone::EmailedToDhad, false) {
        println!("  Uncheck {} -> {}", Milestone::EmailedToDhad.label(), err);
    }

    println!("\nEvaluation gate");
    match coordinator.toggle(Milestone::Evaluated, true) {
        Ok(CoordinatorStep::DocumentsRequired(completion)) => {
            println!("  Required documents attached: {}", completion)
        }
        Ok(CoordinatorStep::Updated(transition)) => println!("  Draft updated: {:?}", transition),
        Err(err) => {
            println!("  Evaluation unavailable: {}", err);
            return Ok(());
        }
    }

    let mut attachments = Vec::new();
    for (kind, path) in documents {
        attachments.push((kind, load_file(&path)?));
    }
    if !no_placeholders {
        for kind in DocumentKind::required_kinds() {
            if attachments.iter().all(|(attached, _)| *attached != kind) {
                attachments.push((kind, placeholder_pdf(kind)));
            }
        }
    }

    for (kind, file) in attachments {
        println!("  {} <- {} ({} bytes)", kind.label(), file.file_name, file.size());
        if coordinator.select_document(kind, file).is_err() {
            continue;
        }
        let _ = coordinator.upload_document(kind, None);
    }

    match coordinator.finish_documents() {
        Ok(_) => println!("  {} staged", Milestone::Evaluated.label()),
        Err(CoordinatorError::DocumentsIncomplete(completion)) => {
            println!("  Still missing required documents ({})", completion);
            coordinator.cancel_documents();
            return Ok(());
        }
        Err(err) => {
            println!("  Document step failed: {}", err);
            return Ok(());
        }
    }
    report_save("  Save evaluated", coordinator.save(true));

    println!("\nEvaluation checklist");
    for override_existing in [false, true] {
        match coordinator.generate_checklist_document(override_existing) {
            Ok(GenerateOutcome::Generated(document)) => println!(
                "  {} (regenerated: {})",
                document.file_name, document.regenerated
            ),
            Ok(GenerateOutcome::AlreadyExists) => {
                println!("  Checklist already attached; requesting override")
            }
            Err(err) => println!("  Generation failed: {}", err),
        }
    }

    let attached = service.list_documents(&application.id, ApplicationType::DirectHire)?;
    println!("  Attached documents: {}", attached.len());
    for document in attached {
        println!("    - {} -> {}", document.document_type, document.file_name);
    }

    match coordinator.draft().current_status() {
        Some(milestone) => println!("\nCurrent status: {}", milestone.label()),
        None => println!("\nCurrent status: pending"),
    }
    match serde_json::to_string_pretty(coordinator.draft()) {
        Ok(json) => println!("Status checklist payload:\n{}", json),
        Err(err) => println!("Status checklist payload unavailable: {}", err),
    }

    Ok(())
}

fn report_save(label: &str, outcome: Result<SaveOutcome, CoordinatorError>) {
    match outcome {
        Ok(SaveOutcome::NoChanges) => println!("{label}: nothing to save"),
        Ok(SaveOutcome::ConfirmationRequired(pending)) => {
            let labels: Vec<&str> = pending.iter().map(|milestone| milestone.label()).collect();
            println!("{label}: confirmation required for {}", labels.join(", "))
        }
        Ok(SaveOutcome::Saved(_)) => println!("{label}: saved"),
        Err(err) => println!("{label}: failed ({err})"),
    }
}

fn load_file(path: &Path) -> Result<UploadFile, AppError> {
    let bytes = std::fs::read(path)?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(UploadFile::new(file_name, content_type, bytes))
}

fn placeholder_pdf(kind: DocumentKind) -> UploadFile {
    let body = format!("%PDF-1.4\n% placeholder {}\n%%EOF\n", kind.label());
    UploadFile::new(
        format!("{}.pdf", kind.key()),
        mime_guess::mime::APPLICATION_PDF,
        body.into_bytes(),
    )
}

pub(crate) fn run_control_numbers(args: ControlNumberArgs) -> Result<(), AppError> {
    let day = args.date.unwrap_or_else(|| Local::now().date_naive());
    let generator = if args.issued_today == 0 && args.issued_this_year == 0 {
        ControlNumberGenerator::new()
    } else {
        ControlNumberGenerator::resume_from(day, args.issued_today, args.issued_this_year)
    };

    println!("Control numbers for {}", day);
    for _ in 0..args.count {
        println!("- {}", generator.next(day));
    }
    Ok(())
}

pub(crate) fn run_conversion(args: ConvertArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rates = ExchangeRates::from_config(&config.salary)?;
    let converted = rates.convert(MonetaryAmount::new(args.amount, args.from), args.to)?;
    println!(
        "{} = {} (as of {})",
        MonetaryAmount::new(args.amount, args.from),
        converted,
        Utc::now().date_naive()
    );
    Ok(())
}
