use chalkboard::config::{self, AppConfig};
use chalkboard::edit::{EditService, ImageSubmission, LabelSelection, SubmitOutcome};
use chalkboard::store::{sha256_hex, ContentStore};
use chalkboard::types::{
    ContentLicense, Contributor, EntityId, Image, LiteracySkill, Locale, NumeracySkill,
};
use chalkboard::validate::{self, Upload};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chalkboard")]
#[command(about = "Admin CLI for literacy-education image content")]
#[command(long_about = "\
Admin CLI for literacy-education image content

Images are validated on the way in: PNG/JPG uploads below the configured
minimum width are rejected, wider ones are downscaled to exactly that width
(aspect ratio preserved), GIFs are stored as-is. Each image carries ordered
letter/number/word label associations used for exercise tagging.

Typical flow:

  chalkboard init
  chalkboard add-letter --letter-locale en --text a
  chalkboard add-word --word-locale en --text apple
  chalkboard import --title \"Apple\" --image-locale en --file apple.png
  chalkboard edit --id 1 --title \"Red Apple\" --file apple-v2.jpg
  chalkboard add-label --id 1 --word-id 1
  chalkboard show --id 1

Run 'chalkboard gen-config' to generate a documented chalkboard.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "chalkboard.toml", global = true)]
    config: PathBuf,

    /// Contributor name recorded in logs
    #[arg(long, default_value = "cli", global = true)]
    contributor: String,

    /// Contributor locale (scopes label option lists)
    #[arg(long, default_value = "en", global = true)]
    locale: Locale,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database file and schema
    Init,
    /// Print a stock chalkboard.toml with all options documented
    GenConfig,
    /// Insert a letter entity
    AddLetter {
        #[arg(long)]
        letter_locale: Locale,
        #[arg(long)]
        text: String,
    },
    /// Insert a number entity
    AddNumber {
        #[arg(long)]
        number_locale: Locale,
        #[arg(long)]
        value: i64,
    },
    /// Insert a word entity
    AddWord {
        #[arg(long)]
        word_locale: Locale,
        #[arg(long)]
        text: String,
    },
    /// Create a new image from a file, running the same validation as edit
    Import {
        #[arg(long)]
        title: String,
        #[arg(long)]
        image_locale: Locale,
        #[arg(long, default_value = "cc_by")]
        license: ContentLicense,
        #[arg(long)]
        file: PathBuf,
    },
    /// Show an image's metadata and labels
    Show {
        #[arg(long)]
        id: EntityId,
    },
    /// Edit an image: new title, license, skills, and/or replacement file
    Edit {
        #[arg(long)]
        id: EntityId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        image_locale: Locale,
        #[arg(long, default_value = "cc_by")]
        license: ContentLicense,
        /// Literacy skills (repeatable)
        #[arg(long = "literacy-skill")]
        literacy_skills: Vec<LiteracySkill>,
        /// Numeracy skills (repeatable)
        #[arg(long = "numeracy-skill")]
        numeracy_skills: Vec<NumeracySkill>,
        /// Replacement image file (.png/.jpg/.jpeg/.gif)
        #[arg(long)]
        file: PathBuf,
    },
    /// Associate labels with an image (any subset of the three kinds)
    AddLabel {
        #[arg(long)]
        id: EntityId,
        #[arg(long)]
        letter_id: Option<EntityId>,
        #[arg(long)]
        number_id: Option<EntityId>,
        #[arg(long)]
        word_id: Option<EntityId>,
    },
    /// Dissociate labels from an image (no-op for absent associations)
    RemoveLabel {
        #[arg(long)]
        id: EntityId,
        #[arg(long)]
        letter_id: Option<EntityId>,
        #[arg(long)]
        number_id: Option<EntityId>,
        #[arg(long)]
        word_id: Option<EntityId>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::load(&cli.config)?;
    let ctx = Contributor { name: cli.contributor.clone(), locale: cli.locale };

    let db_path = app_config.database.path.clone();
    let open_store = || ContentStore::open(Path::new(&db_path));

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Init => {
            open_store()?;
            println!("Initialized {}", app_config.database.path);
        }
        Command::AddLetter { letter_locale, text } => {
            let store = open_store()?;
            let id = store.insert_letter(letter_locale, &text)?;
            println!("letter {id}: {text} ({letter_locale})");
        }
        Command::AddNumber { number_locale, value } => {
            let store = open_store()?;
            let id = store.insert_number(number_locale, value)?;
            println!("number {id}: {value} ({number_locale})");
        }
        Command::AddWord { word_locale, text } => {
            let store = open_store()?;
            let id = store.insert_word(word_locale, &text)?;
            println!("word {id}: {text} ({word_locale})");
        }
        Command::Import { title, image_locale, license, file } => {
            let mut store = open_store()?;
            let upload = read_upload(&file)?;
            // Placeholder id 0: no stored row ever has it, so any image
            // already owning the title counts as a duplicate.
            let outcome = validate::validate_and_normalize(
                &store,
                0,
                &title,
                image_locale,
                Some(&upload),
                &app_config.images,
            )?;
            match outcome {
                validate::Outcome::Rejected(errors) => {
                    print_errors(&errors);
                    std::process::exit(1);
                }
                validate::Outcome::Accepted(normalized) => {
                    let image = Image {
                        id: 0,
                        title: title.to_lowercase(),
                        locale: image_locale,
                        image_format: normalized.format,
                        content_type: normalized.content_type,
                        checksum: sha256_hex(&normalized.bytes),
                        bytes: normalized.bytes,
                        content_license: license,
                        literacy_skills: Vec::new(),
                        numeracy_skills: Vec::new(),
                        revision: 1,
                        last_updated: Utc::now(),
                        letters: Vec::new(),
                        numbers: Vec::new(),
                        words: Vec::new(),
                    };
                    let id = store.insert_image(&image)?;
                    println!("imported image {id} ({})", image.image_format);
                }
            }
        }
        Command::Show { id } => {
            let store = open_store()?;
            let image = store.image(id)?;
            println!("image {id}: {:?} ({}, {})", image.title, image.image_format, image.locale);
            println!("  license:   {}", image.content_license);
            println!("  revision:  {}", image.revision);
            println!("  updated:   {}", image.last_updated.to_rfc3339());
            println!("  checksum:  {}", image.checksum);
            println!("  payload:   {} bytes ({})", image.bytes.len(), image.content_type);
            let literacy: Vec<_> = image.literacy_skills.iter().map(|s| s.as_str()).collect();
            let numeracy: Vec<_> = image.numeracy_skills.iter().map(|s| s.as_str()).collect();
            println!("  skills:    literacy=[{}] numeracy=[{}]", literacy.join(", "), numeracy.join(", "));
            for letter in &image.letters {
                println!("  letter {}: {}", letter.id, letter.text);
            }
            for number in &image.numbers {
                println!("  number {}: {}", number.id, number.value);
            }
            for word in &image.words {
                println!("  word {}: {}", word.id, word.text);
            }
        }
        Command::Edit { id, title, image_locale, license, literacy_skills, numeracy_skills, file } => {
            let store = open_store()?;
            let upload = read_upload(&file)?;
            let mut service = EditService::new(store, app_config.images.clone());
            let submission = ImageSubmission {
                title,
                locale: image_locale,
                content_license: license,
                literacy_skills,
                numeracy_skills,
                upload: Some(upload),
            };
            match service.submit(&ctx, id, submission)? {
                SubmitOutcome::Saved(id) => println!("saved image {id}"),
                SubmitOutcome::Rejected { errors, .. } => {
                    print_errors(&errors);
                    std::process::exit(1);
                }
            }
        }
        Command::AddLabel { id, letter_id, number_id, word_id } => {
            let store = open_store()?;
            let mut service = EditService::new(store, app_config.images.clone());
            service.add_labels(&ctx, id, LabelSelection { letter_id, number_id, word_id })?;
            println!("success");
        }
        Command::RemoveLabel { id, letter_id, number_id, word_id } => {
            let store = open_store()?;
            let mut service = EditService::new(store, app_config.images.clone());
            service.remove_labels(&ctx, id, LabelSelection { letter_id, number_id, word_id })?;
            println!("success");
        }
    }

    Ok(())
}

/// Read a file into an [`Upload`], keeping the original filename so the
/// pipeline's extension detection sees what a browser would have sent.
fn read_upload(path: &Path) -> Result<Upload, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = validate::detect_format(&filename)
        .map(|f| f.canonical_content_type().to_string());
    Ok(Upload { filename, content_type, bytes })
}

fn print_errors(errors: &chalkboard::validate::FieldErrors) {
    for error in errors.iter() {
        eprintln!("{}/{}: {}", error.field(), error.code(), error);
    }
}
