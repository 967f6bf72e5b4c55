//! Error types surfaced by the list controller and the capture flows.
//!
//! Messages are the user-facing Spanish strings the UI shows verbatim.

use thiserror::Error;

/// Business-rule violations found by `validate_list_data`. Kept as distinct
/// variants so callers can ignore a specific rule (rename-only updates skip
/// [`ValidationError::NoItems`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El nombre de la lista no puede estar vacío")]
    EmptyName,
    #[error("El nombre de la lista es demasiado largo (máximo {max} caracteres)")]
    NameTooLong { max: usize },
    #[error("Ya existe una lista con el nombre '{0}' en esta categoría")]
    DuplicateName(String),
    #[error("La lista debe tener al menos un paso/item")]
    NoItems,
    #[error("La lista no puede tener más de {max} pasos")]
    TooManyItems { max: usize },
    #[error("El paso #{0} debe tener un nombre/label")]
    MissingLabel(usize),
    #[error("El nombre del paso #{0} es demasiado largo")]
    LabelTooLong(usize),
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Lista con ID {0} no encontrada")]
    NotFound(i64),
    #[error("La lista está vacía")]
    EmptyList,
    #[error("No se encontraron items válidos para crear la lista")]
    NoValidItems,
    #[error("Error al eliminar lista")]
    DeleteFailed,
    #[error("Error al copiar al clipboard: {0}")]
    Clipboard(#[source] anyhow::Error),
    /// Any failure coming out of the persistence layer. `action` reads as the
    /// tail of "Error al ...".
    #[error("Error al {action}: {source:#}")]
    Store {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ListError {
    pub(crate) fn store(action: &'static str) -> impl FnOnce(anyhow::Error) -> ListError {
        move |source| ListError::Store { action, source }
    }
}

pub type ListResult<T> = Result<T, ListError>;

/// Input problems in the "save URL" and static web item flows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Debes seleccionar una categoría")]
    MissingCategory,
    #[error("Debes ingresar un nombre para el item")]
    MissingLabel,
    #[error("La URL no puede estar vacía")]
    MissingUrl,
    #[error("Ingrese código HTML para crear el item.")]
    MissingHtml,
    #[error("El paso actual no permite esa acción")]
    WrongStep,
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn validation_messages_reference_step_numbers() {
        assert_eq!(
            ValidationError::MissingLabel(3).to_string(),
            "El paso #3 debe tener un nombre/label"
        );
        assert_eq!(
            ListError::from(ValidationError::TooManyItems { max: 50 }).to_string(),
            "La lista no puede tener más de 50 pasos"
        );
    }

    #[test]
    fn store_errors_keep_context_chain() {
        let err = ListError::store("crear lista")(anyhow!("disk full").context("failed to insert item"));
        assert_eq!(err.to_string(), "Error al crear lista: failed to insert item: disk full");
    }
}
