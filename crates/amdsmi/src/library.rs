use crate::entry_points::EntryPoints;
use crate::error::LoadError;
use crate::module::BindingKind;
use crate::module::DynamicOpener;
use crate::module::Module;
use crate::module::ModuleOpener;

/// A binding to one instance of `libamd_smi`.
///
/// Owns the opened module and the entry points resolved from it. Several
/// independent bindings may coexist. `load` and `unload` take `&mut self`;
/// share a binding across threads by wrapping it in a `Mutex`.
pub struct AmdSmiLib {
    opener: Box<dyn ModuleOpener>,
    entries: EntryPoints,
    module: Option<Box<dyn Module>>,
}

impl AmdSmiLib {
    pub fn new(opener: impl ModuleOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            entries: EntryPoints::default(),
            module: None,
        }
    }

    /// Binding that loads the library at runtime from the default locations.
    pub fn dynamic() -> Self {
        Self::new(DynamicOpener::default())
    }

    /// Binding over the symbols linked in at build time.
    #[cfg(feature = "static-link")]
    pub fn linked() -> Self {
        Self::new(crate::module::StaticOpener)
    }

    /// Opens the module and resolves every entry point.
    ///
    /// Loading an already loaded binding is a no-op. On failure the binding
    /// is left unloaded with every entry point unresolved.
    pub fn load(&mut self) -> Result<(), LoadError> {
        if let Some(module) = &self.module {
            tracing::debug!("{} is already loaded", module.name());
            return Ok(());
        }

        let module = self.opener.open()?;

        let entries = match EntryPoints::resolve(module.as_ref()) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!("Error loading {}: {err}", module.name());
                // the module is closed when dropped here
                return Err(err);
            }
        };

        tracing::info!(
            binding = %self.opener.binding(),
            resolved = entries.resolved_count(),
            total = EntryPoints::SYMBOLS.len(),
            "loaded {}",
            module.name()
        );

        self.entries = entries;
        self.module = Some(module);
        Ok(())
    }

    /// Clears every entry point and releases the module. No-op when unloaded.
    pub fn unload(&mut self) {
        self.entries = EntryPoints::default();
        if let Some(module) = self.module.take() {
            tracing::info!("unloaded {}", module.name());
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.module.is_some()
    }

    pub fn binding(&self) -> BindingKind {
        self.opener.binding()
    }

    pub fn library_name(&self) -> Option<&str> {
        self.module.as_deref().map(|module| module.name())
    }

    /// Raw entry points. Every entry is unresolved while unloaded.
    ///
    /// The table cannot be copied out of the binding:
    ///
    /// ```compile_fail
    /// let lib = amdsmi::AmdSmiLib::dynamic();
    /// let entries = *lib.entries();
    /// ```
    ///
    /// ```compile_fail
    /// let lib = amdsmi::AmdSmiLib::dynamic();
    /// let entries: amdsmi::EntryPoints = lib.entries().clone();
    /// ```
    ///
    /// nor kept across an unload:
    ///
    /// ```compile_fail
    /// let mut lib = amdsmi::AmdSmiLib::dynamic();
    /// let entries = lib.entries();
    /// lib.unload();
    /// let _ = unsafe { entries.amdsmi_shut_down() };
    /// ```
    pub fn entries(&self) -> &EntryPoints {
        &self.entries
    }
}

impl Drop for AmdSmiLib {
    fn drop(&mut self) {
        self.unload();
    }
}

impl std::fmt::Debug for AmdSmiLib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmdSmiLib")
            .field("binding", &self.binding())
            .field("library", &self.library_name())
            .field("resolved", &self.entries.resolved_count())
            .finish()
    }
}
