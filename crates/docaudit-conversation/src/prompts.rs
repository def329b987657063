//! Fixed prompt templates and the placeholder markers they carry

/// Replaced with the user's own message
pub const USER_INPUT_MARKER: &str = "<user-input>";
/// Replaced with the report template answers or a style guide's text
pub const TEMPLATE_MARKER: &str = "<rdti-template>";
/// Replaced with the joined uploaded-document context
pub const ADDITIONAL_CONTEXT_MARKER: &str = "<additional-context>";
/// Replaced with the recommendations from a finished audit
pub const PREVIOUS_RECOMMENDATIONS_MARKER: &str = "<previous-recommendations>";
/// Replaced with one window of text to summarise
pub const TEXT_TO_COMPRESS_MARKER: &str = "<text-to-compress>";

/// Opening assistant message of a fresh chat session
pub const CHAT_GREETING: &str = "How can I help you?";

/// Audit round prompt comparing the user document with one style guide
pub const DOC_AUDIT_PROMPT_WITH_FILES: &str = r#"### Document Audit Instructions
You are an expert business and information technology chatbot with knowledge of the Australian Government writing standards as defined in the style guide. You will be provided with a document by the User that should be compared against the style guide.  Using Australian English language that is compliant with the style guide rules give a full list of all the differences from the style guide found in the User’s document and make sure you provide an updated document with any differences highlighted. Be as accurate and complete and factual as possible.

### Style Guide Text
This is the style guide: <rdti-template>

### Additional File Context
This is the user document that should be compared against the style guide: <additional-context>

### User input
<user-input>"#;

/// Follow-up prompt asking for the document rewritten per earlier recommendations
pub const DOC_AUDIT_CHAT_PROMPT_WITH_FILES: &str = r#"### Document Audit Instructions
You are an expert business and information technology chatbot with knowledge of the Australian Government writing standards as defined in your previous update recommendations. You will be provided with a document by the User that should be updated based on your previous update recommendations.  Using Australian English language that is compliant with the style guide rules provide an updated document that follows your recommendations. Be as accurate and complete and factual as possible.

### Previous Update Recommendations
This is your previous update recommendations: <previous-recommendations>

### Additional File Context
This is the user document that should be compared against the style guide: <additional-context>

### User input
<user-input>"#;

pub const CHAT_PROMPT_WITH_FILES: &str = r#"### Document Analysis Instructions
You are an expert business and information technology chatbot. You will be provided with information about a company or an information technology solution. This information may or may not be relevant. Answer user questions as accurately and factually as possible.

### Main Template Text
<rdti-template>

### Additional File Context
<additional-context>

### User input
<user-input>"#;

pub const CHAT_PROMPT_WITHOUT_FILES: &str = r#"### Document Analysis Instructions
You are an expert business and information technology chatbot. Answer user questions as accurately and factually as possible.

### User input
<user-input>
"#;

/// Prompt used by the chunked summarizer for each token window
pub const SUMMARIZATION_PROMPT: &str = r#"
You will be given a dump of raw text, which has been uploaded by an individual at a company who is looking to understand if their project is eligble for R&D tax credits.
Your task is to reduce down and extract ONLY the relevant text, for writing an R&D tax credit report. They might upload things that are not relevant.

You will details relevant to the output report that will be written for R&D tax credits. 


Here are details you may include:

DO NOT include the KEY of the dictionary IF there is NO QUOTE you can cite for it. I want you to quote the paragraphs used for each of the fields below.

{
    "dates": [{"date":, "dateInfo":}],
    "projectInfo":,
    "companyInfo":,
    "projectObjectives":,
    "hypothesis":,
    "problems":,
    "opportunities":,
    "experiments":,
    "activities:",
    "researchInfo":,
    "how_get_new_knowledge":,
    "experiments_evaluation": ,
    "observations_of_experiments":
}

It is important to remember, that it may be that NONE of the text is relevant. Do not feel under any pressure to return things if nothing is relevant! Just do not include the item in the json if that is the case.
We need to preserve as many details as possible to write the final report, while also cutting down the amount of text we read (we will read your outputs, and use those to write the report)

<text-to-compress>

The compressed and filtered text, which could now be used as a summary of the input file for the purposes of writing the R&D tax report is is:"#;
