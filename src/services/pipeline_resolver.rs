//! Pipeline resolver: the ordered fallback chain behind every conversion.
//!
//! Stages, tried in order until one succeeds:
//! 1. Realtime: assemble the single smali unit and decompile the result.
//! 2. Full container: decompile an enclosing DEX/APK found on disk.
//! 3. Precomputed: read an existing Java file from a conventional source tree.
//!
//! Stage failures fall through. If every stage fails the result is
//! `NotFound`, or `Failed` when a stage broke outside the tool contract.
//! Cancellation is checked between stages and before returning and always
//! wins over any stage outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::project_layout::{LayoutProbe, ProjectLayout};
use crate::domain::errors::{ConversionError, ConversionResult};
use crate::domain::models::{
    ClassIdentity, ConversionRequest, ConvertedSource, Explanation, OriginDetails,
    PipelineResult, Provenance, Stage, StageAttempt,
};
use crate::domain::ports::{AssembleRequest, Assembler, Decompiler, OutputScope, ToolStatus};

const SCRATCH_PREFIX: &str = "smali2java-";

/// Resolves conversion requests through the stage chain.
pub struct PipelineResolver {
    assembler: Arc<dyn Assembler>,
    decompiler: Arc<dyn Decompiler>,
    layout: ProjectLayout,
    work_dir: Option<PathBuf>,
}

impl PipelineResolver {
    pub fn new(
        assembler: Arc<dyn Assembler>,
        decompiler: Arc<dyn Decompiler>,
        layout: ProjectLayout,
    ) -> Self {
        Self {
            assembler,
            decompiler,
            layout,
            work_dir: None,
        }
    }

    /// Create scratch directories under `dir` instead of the system temp dir.
    #[must_use]
    pub fn with_work_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.work_dir = dir;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run the stage chain for `request`.
    #[instrument(
        skip(self, request, cancel),
        fields(identity = %request.identity, generation = request.generation)
    )]
    pub async fn resolve(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let disk_text = Self::disk_header_text(request).await;
        let text = request.text.as_deref().or(disk_text.as_deref());
        let probe = self.layout.probe(request.identity.path(), text);
        let mut attempts = Vec::new();
        let mut searched = Vec::new();

        for stage in Stage::ALL {
            if cancel.is_cancelled() {
                return PipelineResult::Cancelled;
            }

            let outcome = match stage {
                Stage::Realtime => self.realtime(request, &probe, cancel).await,
                Stage::FullContainer => self.full_container(&probe, &mut searched, cancel).await,
                Stage::Precomputed => self.precomputed(&probe, &mut searched).await,
            };

            match outcome {
                _ if cancel.is_cancelled() => return PipelineResult::Cancelled,
                Err(ConversionError::Cancelled) => return PipelineResult::Cancelled,
                Ok(converted) => {
                    tracing::info!(
                        stage = stage.as_str(),
                        provenance = %converted.provenance,
                        "conversion resolved"
                    );
                    return PipelineResult::Success(converted);
                }
                Err(error) => {
                    tracing::debug!(stage = stage.as_str(), %error, "stage failed, falling through");
                    attempts.push(StageAttempt { stage, error });
                }
            }
        }

        if cancel.is_cancelled() {
            return PipelineResult::Cancelled;
        }

        Self::terminal(&probe, attempts, searched)
    }

    /// File contents for the `.class` header fallback of a disk request.
    ///
    /// Only read when there is no editor text and the path gives no class.
    /// An unreadable file counts as having no header.
    async fn disk_header_text(request: &ConversionRequest) -> Option<String> {
        let path = request.identity.path();
        if request.text.is_some() || ProjectLayout::class_from_path(path).is_some() {
            return None;
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "unable to read file for class header");
                None
            }
        }
    }

    /// Stage 1: assemble the single unit and decompile it.
    async fn realtime(
        &self,
        request: &ConversionRequest,
        probe: &LayoutProbe,
        cancel: &CancellationToken,
    ) -> ConversionResult<ConvertedSource> {
        let Some(ref class) = probe.path_class else {
            return Err(ConversionError::SourceNotFound(
                "class name could not be derived from the file path".to_string(),
            ));
        };

        if !self.assembler.is_available().await {
            return Err(ConversionError::tool_unavailable(
                self.assembler.name(),
                self.assembler.install_hint(),
            ));
        }
        if !self.decompiler.is_available().await {
            return Err(ConversionError::tool_unavailable(
                self.decompiler.name(),
                self.decompiler.install_hint(),
            ));
        }

        let scratch = self.scratch_dir().await?;
        let source_unit = match request.text {
            Some(ref text) => {
                let path = scratch.path().join(unit_file_name(class));
                tokio::fs::write(&path, text.as_bytes()).await?;
                path
            }
            None => request.identity.path().to_path_buf(),
        };

        let assembled = self
            .assembler
            .assemble(
                &AssembleRequest {
                    source_unit,
                    class: class.clone(),
                    output: scratch.path().join("classes.dex"),
                },
                cancel,
            )
            .await?;

        let container = match (assembled.status, assembled.container) {
            (ToolStatus::Success, Some(container)) => container,
            _ => return Err(ConversionError::AssembleFailed(assembled.diagnostics)),
        };

        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        let text = self
            .decompile_and_extract(&container, class, scratch.path(), cancel)
            .await?;
        Ok(ConvertedSource::new(text, Provenance::RealtimePipeline))
    }

    /// Stage 2: decompile an enclosing container.
    async fn full_container(
        &self,
        probe: &LayoutProbe,
        searched: &mut Vec<PathBuf>,
        cancel: &CancellationToken,
    ) -> ConversionResult<ConvertedSource> {
        let Some(ref class) = probe.class else {
            return Err(ConversionError::SourceNotFound(
                "class name unknown: no smali root in the path and no .class directive".to_string(),
            ));
        };

        if !self.decompiler.is_available().await {
            return Err(ConversionError::tool_unavailable(
                self.decompiler.name(),
                self.decompiler.install_hint(),
            ));
        }

        let mut found = None;
        for candidate in self.layout.container_candidates(probe).await {
            searched.push(candidate.clone());
            if let Some(metadata) = file_metadata(&candidate).await {
                found = Some((candidate, metadata));
                break;
            }
        }
        let Some((container, metadata)) = found else {
            return Err(ConversionError::SourceNotFound(
                "no enclosing DEX or APK found".to_string(),
            ));
        };

        tracing::debug!(container = %container.display(), %class, "decompiling enclosing container");

        let scratch = self.scratch_dir().await?;
        let text = self
            .decompile_and_extract(&container, class, scratch.path(), cancel)
            .await?;
        Ok(ConvertedSource::new(text, Provenance::ContainerDecompiled)
            .with_origin(OriginDetails::from_metadata(&container, &metadata)))
    }

    /// Stage 3: read an existing Java source.
    async fn precomputed(
        &self,
        probe: &LayoutProbe,
        searched: &mut Vec<PathBuf>,
    ) -> ConversionResult<ConvertedSource> {
        let Some(ref class) = probe.class else {
            return Err(ConversionError::SourceNotFound(
                "class name unknown: no smali root in the path and no .class directive".to_string(),
            ));
        };

        let candidates = self.layout.precomputed_candidates(probe);
        let count = candidates.len();
        for candidate in candidates {
            searched.push(candidate.clone());
            let Some(metadata) = file_metadata(&candidate).await else {
                continue;
            };
            let bytes = match tokio::fs::read(&candidate).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::warn!(path = %candidate.display(), %error, "skipping unreadable precomputed source");
                    continue;
                }
            };
            tracing::debug!(path = %candidate.display(), "found precomputed source");
            return Ok(ConvertedSource::new(
                String::from_utf8_lossy(&bytes).into_owned(),
                Provenance::PrecomputedSourceFound,
            )
            .with_origin(OriginDetails::from_metadata(&candidate, &metadata)));
        }

        Err(ConversionError::SourceNotFound(format!(
            "no Java source for {class} in {count} candidate locations"
        )))
    }

    /// Stage 4: explain why nothing worked.
    fn terminal(
        probe: &LayoutProbe,
        attempts: Vec<StageAttempt>,
        searched: Vec<PathBuf>,
    ) -> PipelineResult {
        let file_name = probe
            .file
            .file_name()
            .map_or_else(|| probe.file.display().to_string(), |n| n.to_string_lossy().into_owned());

        let mut hints = Vec::new();
        for attempt in &attempts {
            if let ConversionError::ToolUnavailable { ref hint, .. } = attempt.error {
                if !hints.contains(hint) {
                    hints.push(hint.clone());
                }
            }
        }
        if probe.bytecode_root.is_none() {
            hints.push(
                "smali files are expected under a 'smali' or 'smali_classes<N>' directory"
                    .to_string(),
            );
        }
        hints.push(
            "decompiled Java can be placed in 'sources/' or 'java_src/' next to the smali directory"
                .to_string(),
        );

        let unexpected = attempts.iter().any(|a| a.error.is_unexpected());
        let explanation = Explanation {
            summary: format!("Unable to convert {file_name} to Java"),
            attempts,
            searched,
            hints,
        };

        tracing::info!(
            file = %probe.file.display(),
            unexpected,
            "no stage produced a conversion"
        );

        if unexpected {
            PipelineResult::Failed(explanation)
        } else {
            PipelineResult::NotFound(explanation)
        }
    }

    async fn decompile_and_extract(
        &self,
        container: &Path,
        class: &ClassIdentity,
        scratch: &Path,
        cancel: &CancellationToken,
    ) -> ConversionResult<String> {
        let scope = OutputScope {
            output_dir: scratch.join("out"),
            class_filter: Some(class.clone()),
        };
        let decompiled = self
            .decompiler
            .decompile_container(container, &scope, cancel)
            .await?;

        let tree = match (decompiled.status, decompiled.source_tree) {
            (ToolStatus::Success, Some(tree)) => tree,
            _ => return Err(ConversionError::DecompileFailed(decompiled.diagnostics)),
        };

        if cancel.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        extract_entry(&tree, class).await
    }

    async fn scratch_dir(&self) -> ConversionResult<TempDir> {
        if let Some(ref base) = self.work_dir {
            tokio::fs::create_dir_all(base).await?;
        }
        let base = self.work_dir.clone();
        let dir = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(SCRATCH_PREFIX);
            match base {
                Some(ref base) => builder.tempdir_in(base),
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(|error| ConversionError::Unexpected(format!("scratch directory task failed: {error}")))??;
        Ok(dir)
    }
}

/// File name to give an in-memory smali unit in the scratch directory.
fn unit_file_name(class: &ClassIdentity) -> PathBuf {
    class
        .smali_relative_path()
        .file_name()
        .map_or_else(|| PathBuf::from("unit.smali"), PathBuf::from)
}

/// Metadata of `path` if it is an existing regular file.
async fn file_metadata(path: &Path) -> Option<std::fs::Metadata> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Some(metadata),
        _ => None,
    }
}

/// Read the Java file for `class` out of a decompiled tree.
async fn extract_entry(tree: &Path, class: &ClassIdentity) -> ConversionResult<String> {
    let relative = class.java_relative_path();
    for root in [tree.to_path_buf(), tree.join("sources")] {
        let path = root.join(&relative);
        if file_metadata(&path).await.is_some() {
            let bytes = tokio::fs::read(&path).await?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    Err(ConversionError::DecompileFailed(format!(
        "{} is missing from the decompiler output",
        relative.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tools::mock::stub_source;
    use crate::adapters::tools::{MockAssembler, MockDecompiler};
    use crate::domain::models::{ContentSnapshot, SourceIdentity};
    use std::fs;

    const MAIN_SMALI: &str = ".class public Lcom/example/Main;\n.super Ljava/lang/Object;\n";

    struct Fixture {
        dir: TempDir,
        file: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("app/smali/com/example/Main.smali");
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(&file, MAIN_SMALI).unwrap();
            Self { dir, file }
        }

        fn project(&self) -> PathBuf {
            self.dir.path().join("app")
        }

        fn write(&self, relative: &str, contents: &str) -> PathBuf {
            let path = self.project().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
            path
        }

        fn request(&self, text: Option<&str>) -> ConversionRequest {
            ConversionRequest {
                identity: SourceIdentity::new(&self.file),
                snapshot: ContentSnapshot::of_text(text.unwrap_or(MAIN_SMALI)),
                generation: 1,
                text: text.map(Arc::from),
            }
        }
    }

    fn resolver(assembler: MockAssembler, decompiler: MockDecompiler) -> PipelineResolver {
        PipelineResolver::new(
            Arc::new(assembler),
            Arc::new(decompiler),
            ProjectLayout::default(),
        )
    }

    fn class() -> ClassIdentity {
        ClassIdentity::from_binary_name("com/example/Main").unwrap()
    }

    #[tokio::test]
    async fn test_realtime_stage_wins() {
        let fixture = Fixture::new();
        fixture.write("sources/com/example/Main.java", "class Precomputed {}");

        let result = resolver(MockAssembler::new(), MockDecompiler::new())
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;

        let converted = result.converted().expect("expected success");
        assert_eq!(converted.provenance, Provenance::RealtimePipeline);
        assert_eq!(&*converted.text, stub_source(&class()));
    }

    #[tokio::test]
    async fn test_realtime_uses_disk_file_without_text() {
        let fixture = Fixture::new();
        let result = resolver(MockAssembler::new(), MockDecompiler::new())
            .resolve(&fixture.request(None), &CancellationToken::new())
            .await;
        assert_eq!(
            result.converted().unwrap().provenance,
            Provenance::RealtimePipeline
        );
    }

    #[tokio::test]
    async fn test_container_stage_after_assemble_failure() {
        let fixture = Fixture::new();
        let dex = fixture.write("build/apk/classes.dex", "dex\n035");

        let decompiler = MockDecompiler::new().with_output(class(), "class FromApk {}");
        let result = resolver(MockAssembler::failing("syntax error"), decompiler)
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;

        let converted = result.converted().expect("expected success");
        assert_eq!(converted.provenance, Provenance::ContainerDecompiled);
        assert_eq!(&*converted.text, "class FromApk {}");
        assert_eq!(converted.origin.as_ref().unwrap().path, dex);
    }

    #[tokio::test]
    async fn test_precomputed_stage_when_tools_missing() {
        let fixture = Fixture::new();
        let java = fixture.write("sources/com/example/Main.java", "class Main {}");

        let result = resolver(MockAssembler::unavailable(), MockDecompiler::unavailable())
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;

        let converted = result.converted().expect("expected success");
        assert_eq!(converted.provenance, Provenance::PrecomputedSourceFound);
        assert_eq!(&*converted.text, "class Main {}");
        let origin = converted.origin.as_ref().unwrap();
        assert_eq!(origin.path, java);
        assert_eq!(origin.len, 13);
    }

    #[tokio::test]
    async fn test_sibling_root_substitution() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app/smali_classes2/a/B$1.smali");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, ".class La/B$1;\n").unwrap();
        let java = dir.path().join("app/java_src_classes2/a/B.java");
        fs::create_dir_all(java.parent().unwrap()).unwrap();
        fs::write(&java, "class B {}").unwrap();

        let request = ConversionRequest {
            identity: SourceIdentity::new(&file),
            snapshot: ContentSnapshot::of_file(&file).unwrap(),
            generation: 1,
            text: None,
        };
        let result = resolver(MockAssembler::unavailable(), MockDecompiler::unavailable())
            .resolve(&request, &CancellationToken::new())
            .await;

        assert_eq!(result.converted().unwrap().origin.as_ref().unwrap().path, java);
    }

    #[tokio::test]
    async fn test_header_identity_for_fallback_stages() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scratch/Main.smali");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, MAIN_SMALI).unwrap();
        let java = dir.path().join("scratch/sources/com/example/Main.java");
        fs::create_dir_all(java.parent().unwrap()).unwrap();
        fs::write(&java, "class Main {}").unwrap();

        let assembler = Arc::new(MockAssembler::new());
        let resolver = PipelineResolver::new(
            assembler.clone(),
            Arc::new(MockDecompiler::new()),
            ProjectLayout::default(),
        );
        let request = ConversionRequest {
            identity: SourceIdentity::new(&file),
            snapshot: ContentSnapshot::of_text(MAIN_SMALI),
            generation: 1,
            text: Some(Arc::from(MAIN_SMALI)),
        };
        let result = resolver.resolve(&request, &CancellationToken::new()).await;

        assert_eq!(
            result.converted().unwrap().provenance,
            Provenance::PrecomputedSourceFound
        );
        // Realtime needs a path-derived identity
        assert_eq!(assembler.calls(), 0);
    }

    #[tokio::test]
    async fn test_header_identity_read_from_disk_without_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scratch/Main.smali");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, MAIN_SMALI).unwrap();
        let java = dir.path().join("scratch/sources/com/example/Main.java");
        fs::create_dir_all(java.parent().unwrap()).unwrap();
        fs::write(&java, "class Main {}").unwrap();

        let resolver = resolver(MockAssembler::unavailable(), MockDecompiler::unavailable());
        let request = ConversionRequest {
            identity: SourceIdentity::new(&file),
            snapshot: ContentSnapshot::of_file(&file).unwrap(),
            generation: 1,
            text: None,
        };
        let result = resolver.resolve(&request, &CancellationToken::new()).await;

        let converted = result.converted().unwrap();
        assert_eq!(converted.provenance, Provenance::PrecomputedSourceFound);
        assert_eq!(&*converted.text, "class Main {}");
    }

    #[tokio::test]
    async fn test_unreadable_disk_file_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("scratch/Gone.smali");

        let request = ConversionRequest {
            identity: SourceIdentity::new(&file),
            snapshot: ContentSnapshot::of_text(""),
            generation: 1,
            text: None,
        };
        let result = resolver(MockAssembler::new(), MockDecompiler::new())
            .resolve(&request, &CancellationToken::new())
            .await;

        assert!(matches!(result, PipelineResult::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_precomputed_candidate_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let fixture = Fixture::new();
        let locked = fixture.write("java_src/com/example/Main.java", "class Locked {}");
        let readable = fixture.write("java/com/example/Main.java", "class Main {}");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // Permission bits are not enforced for this user.
            return;
        }

        let result = resolver(MockAssembler::unavailable(), MockDecompiler::unavailable())
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;

        let converted = result.converted().unwrap();
        assert_eq!(&*converted.text, "class Main {}");
        assert_eq!(converted.origin.as_ref().unwrap().path, readable);
    }

    #[tokio::test]
    async fn test_scratch_dir_created_under_missing_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("nested/work");
        let resolver = resolver(MockAssembler::new(), MockDecompiler::new())
            .with_work_dir(Some(work_dir.clone()));

        let scratch = resolver.scratch_dir().await.unwrap();
        assert!(scratch.path().starts_with(&work_dir));
        assert!(scratch.path().is_dir());
    }

    #[tokio::test]
    async fn test_all_stages_fail_is_not_found() {
        let fixture = Fixture::new();
        let result = resolver(
            MockAssembler::failing("bad register"),
            MockDecompiler::failing("corrupt dex"),
        )
        .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
        .await;

        let PipelineResult::NotFound(explanation) = result else {
            panic!("expected NotFound, got {result:?}");
        };
        let stages: Vec<Stage> = explanation.attempts.iter().map(|a| a.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert!(matches!(
            explanation.attempts[0].error,
            ConversionError::AssembleFailed(ref d) if d == "bad register"
        ));
        assert!(explanation
            .searched
            .contains(&fixture.project().join("sources/com/example/Main.java")));
        assert!(!explanation.render().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_tools_produce_hints() {
        let fixture = Fixture::new();
        let result = resolver(MockAssembler::unavailable(), MockDecompiler::new())
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;

        let PipelineResult::NotFound(explanation) = result else {
            panic!("expected NotFound, got {result:?}");
        };
        assert!(explanation
            .hints
            .contains(&"mock assembler disabled".to_string()));
    }

    #[tokio::test]
    async fn test_unexpected_error_is_failed() {
        let fixture = Fixture::new();
        let blocker = fixture.dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let result = resolver(MockAssembler::new(), MockDecompiler::unavailable())
            .with_work_dir(Some(blocker.join("work")))
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;

        // Realtime: decompiler missing. Container: decompiler missing.
        // Precomputed: nothing on disk. No unexpected error yet.
        assert!(matches!(result, PipelineResult::NotFound(_)));

        let result = resolver(MockAssembler::new(), MockDecompiler::new())
            .with_work_dir(Some(blocker.join("work")))
            .resolve(&fixture.request(Some(MAIN_SMALI)), &CancellationToken::new())
            .await;
        let PipelineResult::Failed(explanation) = result else {
            panic!("expected Failed, got {result:?}");
        };
        assert!(explanation.attempts[0].error.is_unexpected());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let fixture = Fixture::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let assembler = Arc::new(MockAssembler::new());
        let resolver = PipelineResolver::new(
            assembler.clone(),
            Arc::new(MockDecompiler::new()),
            ProjectLayout::default(),
        );
        let result = resolver
            .resolve(&fixture.request(Some(MAIN_SMALI)), &cancel)
            .await;

        assert_eq!(result, PipelineResult::Cancelled);
        assert_eq!(assembler.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_stage_is_cancelled_not_failed() {
        let fixture = Fixture::new();
        let cancel = CancellationToken::new();
        let resolver = resolver(
            MockAssembler::new().with_delay(std::time::Duration::from_secs(30)),
            MockDecompiler::new(),
        );

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = resolver
            .resolve(&fixture.request(Some(MAIN_SMALI)), &cancel)
            .await;
        assert_eq!(result, PipelineResult::Cancelled);
    }
}
