// Prompt builders for the annotation and delegated clustering calls.
//
// Every prompt asks for a bare JSON object. Models ignore that often
// enough that responses always go through `extract` afterwards.

const ANALYST_PREAMBLE: &str = "Sei un analista di notizie. Il testo che segue è un articolo \
di giornale estratto da una pagina HTML.";

const JSON_ONLY: &str = "Rispondi esclusivamente con un oggetto JSON, senza commenti o testo \
aggiuntivo.";

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|t| format!("\"{t}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Ask for the single main topic of `text` as `{"topic": ...}`.
///
/// With a non-empty `canonical` list the answer is restricted to it.
pub fn topic_prompt(text: &str, canonical: &[String]) -> String {
    let restriction = if canonical.is_empty() {
        String::new()
    } else {
        format!(
            "\nL'argomento deve essere uno solo tra i seguenti: {}.\n",
            quoted_list(canonical)
        )
    };

    format!(
        "{ANALYST_PREAMBLE}\n\
         Individua l'unico argomento principale dell'articolo.\n\
         {JSON_ONLY} Struttura:\n\
         {{\"topic\": \"<argomento principale, vuoto se nessuno è valido>\"}}\n\
         {restriction}\n\
         Testo: {text}"
    )
}

/// Ask for every public figure named in `text` as `{"persons": [...]}`.
pub fn persons_prompt(text: &str) -> String {
    format!(
        "{ANALYST_PREAMBLE}\n\
         Elenca i nomi propri di tutti i personaggi pubblici citati.\n\
         {JSON_ONLY} Struttura:\n\
         {{\"persons\": [\"<nome>\", ...]}} (lista vuota se non ce ne sono)\n\n\
         Testo: {text}"
    )
}

/// Ask for a plain-text summary of `text`. No JSON involved.
pub fn summary_prompt(text: &str) -> String {
    format!(
        "Riassumi il testo seguente. Restituisci solo il riassunto, senza \
         commenti aggiuntivi.\n\nTesto: {text}"
    )
}

/// Ask the model to group `topics` as `{"label": ["topic", ...]}`.
///
/// `topics` should already be de-duplicated. With a non-empty `canonical`
/// list the cluster labels are restricted to it.
pub fn cluster_prompt(topics: &[String], canonical: &[String]) -> String {
    let restriction = if canonical.is_empty() {
        String::new()
    } else {
        format!(
            "\nEvery label MUST be one of: {}.\n",
            quoted_list(canonical)
        )
    };

    format!(
        "You are a news analyzer. Cluster the following news topics so that very \
         similar topics end up in the same cluster.\n\n\
         Topics: {}\n\n\
         Answer ONLY with a JSON object whose keys are cluster labels and whose \
         values are the lists of topics in each cluster.\n\
         {restriction}",
        quoted_list(topics)
    )
}
