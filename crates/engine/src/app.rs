//! Application state and composition.

use std::sync::Arc;

use sheetwright_domain::{ComponentFactory, FormulaEvaluator, PhraseEvaluator};

use crate::infrastructure::{
    clock::SystemClock,
    layout_store::JsonFileLayoutRepo,
    ports::{ClockPort, LayoutRepo, RepoError},
    settings::SheetwrightSettings,
};
use crate::use_cases::TemplateEditor;

/// Main application state.
///
/// Holds the injected ports, the component registry and the use cases built
/// from them.
pub struct App {
    pub settings: SheetwrightSettings,
    pub layouts: Arc<dyn LayoutRepo>,
    pub factory: Arc<ComponentFactory>,
    pub evaluator: Arc<dyn FormulaEvaluator>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub template_editor: TemplateEditor,
}

impl App {
    /// Create a new App around an already opened layout store.
    pub fn new(settings: SheetwrightSettings, layouts: Arc<dyn LayoutRepo>) -> Self {
        let factory = Arc::new(
            ComponentFactory::new().with_unknown_policy(settings.unknown_components),
        );
        let evaluator: Arc<dyn FormulaEvaluator> = Arc::new(PhraseEvaluator::new());

        let template_editor = TemplateEditor::new(
            layouts.clone(),
            factory.clone(),
            evaluator.clone(),
            settings.root_address.clone(),
            settings.event_capacity,
        );

        tracing::debug!(
            component_types = ?factory.technical_names(),
            unknown_components = %settings.unknown_components,
            "Application composed"
        );

        Self {
            settings,
            layouts,
            factory,
            evaluator,
            use_cases: UseCases { template_editor },
        }
    }

    /// Compose the app on top of the JSON-file layout store in
    /// `settings.layout_dir`.
    pub async fn from_settings(settings: SheetwrightSettings) -> Result<Self, RepoError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let layouts = JsonFileLayoutRepo::new(&settings.layout_dir, clock).await?;
        Ok(Self::new(settings, Arc::new(layouts)))
    }
}
