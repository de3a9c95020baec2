// ============================================================
// BATCH IMPORT
// ============================================================
// Orchestrates one bounded batch over the source file:
// parse -> validate -> resolve -> acquire media -> persist.
// Record failures are tallied, never fatal; only environment
// failures (unreadable file, store listing) abort the run.

use crate::application::use_cases::field_rules::FieldValidator;
use crate::application::use_cases::line_parser::LineParser;
use crate::application::use_cases::media_acquirer::{MediaAcquirer, MediaFetcher};
use crate::application::use_cases::reference_resolver::ReferenceResolver;
use crate::domain::catalog::{generate_slug, MediaRecord, NewCatalogEntity, TranslationRecord};
use crate::domain::error::{AppError, Result};
use crate::domain::media::{MediaOutcome, MediaRole};
use crate::domain::record::{Field, FieldMap, RawRecord};
use crate::domain::summary::{FailureKind, RunSummary};
use crate::infrastructure::config::IngestConfig;
use crate::infrastructure::store::CatalogStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Parameters of one run. Offsets are 1-based indices into the data lines,
/// header excluded; line 1 of data is offset 1.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source_path: PathBuf,
    pub batch_size: usize,
    pub start_offset: usize,
    /// Stop cleanly once this instant passes; the summary then carries the
    /// offset to resume from.
    pub deadline: Option<Instant>,
}

pub struct BatchImporter<S: CatalogStore + ?Sized, F: MediaFetcher> {
    store: Arc<S>,
    acquirer: MediaAcquirer<F>,
    config: IngestConfig,
}

impl<S: CatalogStore + ?Sized, F: MediaFetcher> BatchImporter<S, F> {
    pub fn new(store: Arc<S>, acquirer: MediaAcquirer<F>, config: IngestConfig) -> Self {
        Self {
            store,
            acquirer,
            config,
        }
    }

    pub async fn run(&self, opts: &RunOptions) -> Result<RunSummary> {
        let content = std::fs::read_to_string(&opts.source_path).map_err(|e| {
            AppError::IoError(format!(
                "cannot read {}: {}",
                opts.source_path.display(),
                e
            ))
        })?;
        let lines: Vec<&str> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err(AppError::ParseError(format!(
                "{} has no header line",
                opts.source_path.display()
            )));
        }
        let data_lines = &lines[1..];
        let line_count = data_lines.len();

        let start = opts.start_offset.max(1);
        let batch = opts.batch_size.max(1);
        // past-the-end start offsets fall through to an empty batch
        let end_excl = (start + batch).min(line_count + 1);

        info!(
            source = %opts.source_path.display(),
            data_lines = line_count,
            start,
            batch,
            "starting batch import"
        );

        let known_manufacturers = self.store.list_manufacturer_names().await?;
        let validator = FieldValidator::new(
            known_manufacturers,
            self.config.fallback_manufacturers.clone(),
            self.config.allowed_image_hosts.clone(),
        );
        let resolver = ReferenceResolver::new(self.store.clone());
        let parser = LineParser::new().with_delimiter(self.config.delimiter);

        let progress_interval = self.config.progress_interval.max(1);
        let mut summary = RunSummary::default();
        summary.next_start_offset = end_excl;

        for idx in start..end_excl {
            if let Some(deadline) = opts.deadline {
                if Instant::now() >= deadline {
                    warn!(offset = idx, "deadline reached, stopping batch early");
                    summary.cancelled = true;
                    summary.next_start_offset = idx;
                    break;
                }
            }

            // header occupies physical line 1
            let line_number = idx + 1;
            summary.processed += 1;

            let raw = RawRecord {
                line_number,
                fields: parser.parse(data_lines[idx - 1]),
            };
            let verdict = validator.validate(&raw);
            for w in &verdict.warnings {
                summary.record_warning(line_number, w);
            }
            if !verdict.valid {
                let kind = if verdict.structural {
                    FailureKind::Structural
                } else {
                    FailureKind::Validation
                };
                let message = verdict
                    .errors
                    .iter()
                    .map(|e| format!("{} - {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                summary.record_error(line_number, kind, &message);
                continue;
            }
            let Some(map) = verdict.data else {
                continue;
            };
            let reference_code = map.get(Field::ReferenceCode).to_string();

            match self.store.find_entity_by_natural_key(&reference_code).await {
                Ok(Some(existing)) => {
                    debug!(reference = %reference_code, id = %existing, "already present, skipping");
                    summary.skipped += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    summary.record_error(
                        line_number,
                        FailureKind::Persistence,
                        &format!("lookup failed for '{}': {}", reference_code, e),
                    );
                    continue;
                }
            }

            let resolved = match resolver.resolve(&map).await {
                Ok(r) => r,
                Err(failure) => {
                    summary.record_error(line_number, FailureKind::Referential, &failure.message);
                    continue;
                }
            };
            if let Some(w) = &resolved.warning {
                summary.record_warning(line_number, w);
            }

            let (media, touched_network) = self
                .acquire_media(&reference_code, &map, line_number, &mut summary)
                .await;

            let entity = self.build_entity(&map, &reference_code, &resolved.manufacturer_id, &resolved.category_id, media);
            match self.store.create_entity_with_translations_and_media(entity).await {
                Ok(id) => {
                    debug!(reference = %reference_code, id = %id, "created");
                    summary.created += 1;
                }
                Err(e) => {
                    summary.record_error(
                        line_number,
                        FailureKind::Persistence,
                        &format!("create failed for '{}': {}", reference_code, e),
                    );
                }
            }

            if touched_network {
                self.acquirer.pause_between_records().await;
            }
            if summary.processed % progress_interval == 0 {
                info!(
                    processed = summary.processed,
                    created = summary.created,
                    skipped = summary.skipped,
                    errors = summary.errors,
                    "batch progress"
                );
            }
        }

        info!(
            processed = summary.processed,
            created = summary.created,
            skipped = summary.skipped,
            errors = summary.errors,
            warnings = summary.warnings,
            media_downloaded = summary.media_downloaded,
            media_failed = summary.media_failed,
            next_start_offset = summary.next_start_offset,
            cancelled = summary.cancelled,
            "batch finished"
        );
        Ok(summary)
    }

    /// Acquire every media URL of one record. Failures degrade to the remote
    /// URL as the stored location; they never fail the record.
    async fn acquire_media(
        &self,
        reference_code: &str,
        map: &FieldMap,
        line_number: usize,
        summary: &mut RunSummary,
    ) -> (Vec<MediaRecord>, bool) {
        let mut urls = map.image_urls();
        let cap = self.config.max_media_per_record;
        if urls.len() > cap {
            summary.record_warning(
                line_number,
                &format!("only first {} of {} media URLs processed", cap, urls.len()),
            );
            urls.truncate(cap);
        }

        let name_en = map.get(Field::NameEn).to_string();
        let mut media = Vec::with_capacity(urls.len());
        let mut touched_network = false;
        let mut gallery_n = 0usize;
        let mut document_n = 0usize;

        for (i, url) in urls.iter().enumerate() {
            let (role, role_index) = if i == 0 {
                (MediaRole::Primary, 0)
            } else if self.acquirer.infer_extension(url) == ".pdf" {
                document_n += 1;
                (MediaRole::Document, document_n)
            } else {
                gallery_n += 1;
                (MediaRole::Gallery, gallery_n)
            };

            if touched_network {
                self.acquirer.pause_between_downloads().await;
            }

            let descriptor = self
                .acquirer
                .acquire(url, reference_code, role, role_index)
                .await;

            let location = match descriptor.outcome {
                MediaOutcome::Downloaded => {
                    summary.media_downloaded += 1;
                    touched_network = true;
                    descriptor.local_path.unwrap_or_else(|| url.clone())
                }
                MediaOutcome::ReusedExisting => {
                    summary.media_reused += 1;
                    descriptor.local_path.unwrap_or_else(|| url.clone())
                }
                MediaOutcome::Failed => {
                    summary.media_failed += 1;
                    touched_network = true;
                    summary.record_warning(
                        line_number,
                        &format!(
                            "media download failed ({}), keeping remote URL",
                            descriptor
                                .error
                                .unwrap_or_else(|| "unknown error".to_string())
                        ),
                    );
                    url.clone()
                }
            };

            media.push(MediaRecord {
                id: Uuid::new_v4().to_string(),
                role,
                location,
                source_url: url.clone(),
                sort_order: i as i32,
                alt_text: (!name_en.is_empty()).then(|| name_en.clone()),
            });
        }

        (media, touched_network)
    }

    fn build_entity(
        &self,
        map: &FieldMap,
        reference_code: &str,
        manufacturer_id: &str,
        category_id: &str,
        media: Vec<MediaRecord>,
    ) -> NewCatalogEntity {
        let slug = if map.is_blank(Field::Slug) {
            generate_slug(map.get(Field::NameEn), reference_code)
        } else {
            map.get(Field::Slug).to_string()
        };

        let optional = |field: Field| {
            let v = map.get(field);
            (!v.is_empty()).then(|| v.to_string())
        };

        NewCatalogEntity {
            id: Uuid::new_v4().to_string(),
            reference_code: reference_code.to_string(),
            manufacturer_id: manufacturer_id.to_string(),
            category_id: category_id.to_string(),
            slug,
            status: map.get(Field::Status).to_string(),
            featured: map.get(Field::Featured) == "true",
            translations: vec![
                TranslationRecord {
                    language: "fr".to_string(),
                    name: map.get(Field::NameFr).to_string(),
                    description: optional(Field::DescriptionFr),
                    tech_sheet: optional(Field::TechSheetFr),
                },
                TranslationRecord {
                    language: "en".to_string(),
                    name: map.get(Field::NameEn).to_string(),
                    description: optional(Field::DescriptionEn),
                    tech_sheet: optional(Field::TechSheetEn),
                },
            ],
            media,
        }
    }
}
