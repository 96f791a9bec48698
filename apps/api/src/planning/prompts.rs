// Localized prompt fragments for deck generation.
// Placeholders in `{braces}` are filled by `planning::composer`.

use crate::planning::Language;

/// Every fixed text the composer needs for one language.
#[derive(Debug)]
pub struct PromptTemplate {
    /// Replace: {topic}, {slides}, {bullets}
    pub structure: &'static str,
    pub tone: &'static str,
    /// Replace: {slides}, {bullets}, {pairs}
    pub wrong_topics_one: &'static str,
    /// Replace: {slides}, {bullets}, {pairs}
    pub wrong_topics_many: &'static str,
    pub jokes: &'static str,
    pub format: &'static str,
    pub slide: (&'static str, &'static str),
    pub bullet: (&'static str, &'static str),
    pub and: &'static str,
    /// Separator between alternative speaker instructions.
    pub or: &'static str,
}

pub const EN: PromptTemplate = PromptTemplate {
    structure: "Generate bullet-point content for PowerPoint slides on the topic \"{topic}\", \
        in Markdown format. The presentation should contain {slides} with {bullets} per slide.",
    tone: "The presentation style should be casual, but still informative.",
    wrong_topics_one: "Please make {slides} contain {bullets} with made-up facts, somehow \
        connecting the presentation topic with another topic. This topic is: {pairs}.",
    wrong_topics_many: "Please make {slides} each contain {bullets} with made-up facts, somehow \
        connecting the presentation topic with another topic each. These topics are: {pairs}.",
    jokes: "Include 2-3 jokes in the content.",
    format: "Format the answer in Markdown! Use heading 1 for the presentation title, heading 2 \
        for the slide titles, and bullet lists for the bullet points. The answer must consist of \
        Markdown only, do not add any further explanations!",
    slide: ("slide", "slides"),
    bullet: ("bullet point", "bullet points"),
    and: "and",
    or: "OR",
};

pub const DE: PromptTemplate = PromptTemplate {
    structure: "Generiere aus Stichpunkten bestehende Inhalte für PowerPoint-Folien zum Thema \
        \"{topic}\", im Markdown-Format. Die Präsentation soll {slides} enthalten und pro Folie \
        {bullets}.",
    tone: "Der Präsentationsstil soll locker, aber dennoch informativ sein.",
    wrong_topics_one: "Bitte sorge dafür, dass die {slides} genau {bullets} mit komplett falschen \
        Fakten enthält, die das Thema der Präsentation mit einem anderen Thema verbinden. Dieses \
        Thema ist: {pairs}.",
    wrong_topics_many: "Bitte sorge dafür, dass die {slides} je {bullets} mit komplett falschen \
        Fakten enthalten, die das Thema der Präsentation mit jeweils einem anderen Thema \
        verbinden. Diese Themen sind: {pairs}.",
    jokes: "Baue 2-3 Witze in den Inhalt ein.",
    format: "Formatiere die Antwort im Markdown-Format! Verwende Überschrift 1 für den \
        Präsentationstitel, Überschrift 2 für Folientitel, und Aufzählungen für die Stichpunkte. \
        Die Antwort soll ausschließlich Markdown sein, füge keine weiteren Erklärungen hinzu!",
    slide: ("Folie", "Folien"),
    bullet: ("Stichpunkt", "Stichpunkte"),
    and: "und",
    or: "ODER",
};

pub fn template(language: Language) -> &'static PromptTemplate {
    match language {
        Language::De => &DE,
        Language::En => &EN,
    }
}

/// Asks the text generator for presenter instructions as a JSON list.
/// Replace: {count}
pub fn instruction_pool_prompt(language: Language) -> &'static str {
    match language {
        Language::De => "Wir spielen Powerpoint-Karaoke, d.h. der Vortragende hat die Folien \
            noch nie gesehen. Ich suche kreative Ideen für Anweisungen an den Vortragenden bzgl. \
            Vortragsstil oder überraschenden Aktionen während des Vortrags. Bitte gib {count} \
            Ideen für solche Anweisungen. Antworte im JSON-Format. Die Antwort ist eine \
            JSON-Liste, die ausschließlich die Anweisungen als Strings enthält.",
        Language::En => "We are playing PowerPoint karaoke, i.e. the presenter has never seen \
            the slides before. I am looking for creative ideas for instructions to the presenter \
            regarding presentation style or surprising actions during the talk. Please give \
            {count} ideas for such instructions. Answer in JSON format. The answer is a JSON \
            list containing only the instructions as strings.",
    }
}
