use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[default]
    General,
    Math,
    Physics,
    Chemistry,
    Biology,
    History,
    Geography,
    English,
    ComputerScience,
}

impl Subject {
    pub const ALL: [Subject; 9] = [
        Subject::General,
        Subject::Math,
        Subject::Physics,
        Subject::Chemistry,
        Subject::Biology,
        Subject::History,
        Subject::Geography,
        Subject::English,
        Subject::ComputerScience,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Subject::General => "General",
            Subject::Math => "Math",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Biology => "Biology",
            Subject::History => "History",
            Subject::Geography => "Geography",
            Subject::English => "English",
            Subject::ComputerScience => "Computer Science",
        }
    }

    /// Form value, matching the serde name.
    pub fn slug(self) -> &'static str {
        match self {
            Subject::General => "general",
            Subject::Math => "math",
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Biology => "biology",
            Subject::History => "history",
            Subject::Geography => "geography",
            Subject::English => "english",
            Subject::ComputerScience => "computer_science",
        }
    }

    /// Starter questions shown under the input box.
    pub fn suggested_topics(self) -> &'static [&'static str] {
        match self {
            Subject::General => &[
                "How do I make a study timetable?",
                "What is the scientific method?",
                "How does the internet work?",
            ],
            Subject::Math => &[
                "What is the Pythagorean theorem?",
                "How do fractions work?",
                "What is a derivative?",
            ],
            Subject::Physics => &[
                "What is gravity?",
                "What are Newton's three laws?",
                "How does electricity flow?",
            ],
            Subject::Chemistry => &[
                "What is an atom?",
                "How does the periodic table work?",
                "What is a chemical reaction?",
            ],
            Subject::Biology => &[
                "What is photosynthesis?",
                "How do cells divide?",
                "What is DNA?",
            ],
            Subject::History => &[
                "What caused World War I?",
                "Who built the pyramids?",
                "What was the Industrial Revolution?",
            ],
            Subject::Geography => &[
                "How are mountains formed?",
                "What causes earthquakes?",
                "What is climate change?",
            ],
            Subject::English => &[
                "What is a metaphor?",
                "How do I write a thesis statement?",
                "What are the parts of speech?",
            ],
            Subject::ComputerScience => &[
                "What is an algorithm?",
                "How does binary work?",
                "What is recursion?",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    #[default]
    Any,
    Elementary,
    MiddleSchool,
    HighSchool,
    College,
}

impl Grade {
    pub const ALL: [Grade; 5] = [
        Grade::Any,
        Grade::Elementary,
        Grade::MiddleSchool,
        Grade::HighSchool,
        Grade::College,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::Any => "Any",
            Grade::Elementary => "Elementary",
            Grade::MiddleSchool => "Middle School",
            Grade::HighSchool => "High School",
            Grade::College => "College",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Grade::Any => "any",
            Grade::Elementary => "elementary",
            Grade::MiddleSchool => "middle_school",
            Grade::HighSchool => "high_school",
            Grade::College => "college",
        }
    }
}

/// A question plus the qualifiers that narrow its search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyQuery {
    pub question: String,
    #[serde(default)]
    pub subject: Subject,
    #[serde(default)]
    pub grade: Grade,
}

impl StudyQuery {
    pub fn new(question: &str, subject: Subject, grade: Grade) -> Self {
        Self {
            question: question.trim().to_string(),
            subject,
            grade,
        }
    }

    /// The string sent to both search providers.
    pub fn search_string(&self) -> String {
        let mut parts = vec![self.question.as_str()];
        if self.subject != Subject::General {
            parts.push(self.subject.label());
        }
        if self.grade != Grade::Any {
            parts.push(self.grade.label());
        }
        parts.join(" ")
    }
}
