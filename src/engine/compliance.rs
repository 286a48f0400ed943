// src/engine/compliance.rs

use std::collections::BTreeMap;

/// Quatro avisos = escalonamento terminal (sinalizado para fora, não executado aqui).
pub const MAX_WARNING_COUNT: i16 = 4;

/// Políticas obrigatórias ainda sem aceite, na ordem configurada.
pub fn pending_policies(acknowledgments: &BTreeMap<String, bool>, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|policy| !acknowledgments.get(policy.as_str()).copied().unwrap_or(false))
        .cloned()
        .collect()
}

pub fn is_fully_acknowledged(acknowledgments: &BTreeMap<String, bool>, required: &[String]) -> bool {
    pending_policies(acknowledgments, required).is_empty()
}

/// Próximo valor do contador num tick: +1 limitado a 4, sem mudança quando tudo foi aceito.
pub fn next_warning_count(current: i16, fully_acknowledged: bool) -> i16 {
    if fully_acknowledged {
        current
    } else {
        current.saturating_add(1).min(MAX_WARNING_COUNT)
    }
}

/// Aceite completo zera o contador, exceto após o escalonamento (4 é terminal).
pub fn count_after_acknowledgment(current: i16, fully_acknowledged: bool) -> i16 {
    if fully_acknowledged && !is_escalated(current) {
        0
    } else {
        current
    }
}

pub fn is_escalated(count: i16) -> bool {
    count >= MAX_WARNING_COUNT
}
