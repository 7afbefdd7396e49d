//! Rule based breakdown of a goal into weekly tasks.
//!
//! The topic of a goal is guessed from the words in its title and selects a
//! fixed template of study steps. The goal's intensity decides how many of
//! those steps land in each week. The same goal always produces the same
//! tasks.

use serde::Serialize;

use crate::goals::data::{Goal, Intensity};
use crate::internal_error::{InternalError, InternalResult};

use super::data::NewTask;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Programming,
    WebDevelopment,
    DataScience,
    MachineLearning,
    Algorithms,
    Language,
    Mathematics,
    Fitness,
    General,
}

pub struct TaskTemplate {
    pub title: &'static str,
    pub description: &'static str,
}

const fn step(title: &'static str, description: &'static str) -> TaskTemplate {
    TaskTemplate { title, description }
}

// Checked in order; the first topic with a matching keyword wins.
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::MachineLearning,
        &[
            "machine learning",
            "ml",
            "deep learning",
            "neural network",
            "neural networks",
            "ai",
            "artificial intelligence",
            "nlp",
        ],
    ),
    (
        Topic::DataScience,
        &[
            "data science",
            "data analysis",
            "data analytics",
            "pandas",
            "statistics",
            "sql",
            "visualization",
        ],
    ),
    (
        Topic::WebDevelopment,
        &[
            "web",
            "web development",
            "html",
            "css",
            "javascript",
            "react",
            "frontend",
            "backend",
            "full stack",
        ],
    ),
    (
        Topic::Algorithms,
        &[
            "algorithms",
            "algorithm",
            "data structures",
            "dsa",
            "leetcode",
            "competitive programming",
        ],
    ),
    (
        Topic::Programming,
        &[
            "programming",
            "coding",
            "python",
            "rust",
            "java",
            "c++",
            "golang",
            "typescript",
        ],
    ),
    (
        Topic::Language,
        &[
            "spanish",
            "french",
            "german",
            "japanese",
            "english",
            "chinese",
            "language",
            "vocabulary",
        ],
    ),
    (
        Topic::Mathematics,
        &[
            "math",
            "mathematics",
            "calculus",
            "algebra",
            "linear algebra",
            "probability",
            "geometry",
        ],
    ),
    (
        Topic::Fitness,
        &[
            "fitness",
            "workout",
            "running",
            "marathon",
            "gym",
            "strength",
            "yoga",
        ],
    ),
];

const PROGRAMMING_STEPS: &[TaskTemplate] = &[
    step("Set up the toolchain", "Install the compiler or interpreter, an editor and run a hello world program."),
    step("Learn the core syntax", "Work through variables, control flow and functions with small exercises."),
    step("Practice with data types", "Use strings, collections and structured types in short programs."),
    step("Handle errors", "Study how failures are reported and write code that recovers from them."),
    step("Read real code", "Pick a small open source project and trace how it is organized."),
    step("Write tests", "Add unit tests to one of your earlier exercises."),
    step("Build a mini project", "Combine what you learned into a small command line tool."),
    step("Review and refactor", "Revisit earlier code, clean it up and note what you would do differently."),
];

const WEB_STEPS: &[TaskTemplate] = &[
    step("Structure a page with HTML", "Build a static page using semantic HTML elements."),
    step("Style with CSS", "Lay out the page with flexbox or grid and make it responsive."),
    step("Add interactivity", "Use JavaScript to handle events and update the page."),
    step("Fetch data from an API", "Call a public JSON API and render the results."),
    step("Learn a component framework", "Rebuild the page with components and state."),
    step("Build a small backend", "Serve JSON from a minimal HTTP server."),
    step("Connect frontend and backend", "Make the page read and write through your own API."),
    step("Deploy the project", "Publish the site and note what broke along the way."),
];

const DATA_SCIENCE_STEPS: &[TaskTemplate] = &[
    step("Load and inspect a dataset", "Pick a public dataset and summarize its columns."),
    step("Clean the data", "Handle missing values, duplicates and wrong types."),
    step("Explore with statistics", "Compute distributions, correlations and group summaries."),
    step("Visualize findings", "Produce charts that answer one concrete question."),
    step("Query with SQL", "Load the data into a database and answer questions with queries."),
    step("Test a hypothesis", "State a hypothesis and check it with an appropriate test."),
    step("Write up an analysis", "Document the question, method and results in a notebook."),
    step("Present the results", "Turn the write-up into a short presentation."),
];

const MACHINE_LEARNING_STEPS: &[TaskTemplate] = &[
    step("Review the math foundations", "Refresh linear algebra, probability and gradients."),
    step("Prepare a dataset", "Split a dataset into training, validation and test sets."),
    step("Train a baseline model", "Fit a simple linear or tree model and record its score."),
    step("Evaluate properly", "Compare metrics, inspect errors and check for overfitting."),
    step("Engineer features", "Try new features and measure their effect."),
    step("Train a neural network", "Build and train a small network with a framework."),
    step("Tune hyperparameters", "Search over a few settings and keep a results log."),
    step("Ship a model", "Wrap the best model behind a small prediction script or API."),
];

const ALGORITHM_STEPS: &[TaskTemplate] = &[
    step("Arrays and strings", "Solve problems with two pointers and sliding windows."),
    step("Hash maps and sets", "Use hashing to trade memory for speed."),
    step("Stacks and queues", "Practice problems built on LIFO and FIFO structures."),
    step("Recursion and backtracking", "Enumerate subsets and permutations recursively."),
    step("Trees", "Implement traversals and solve binary tree problems."),
    step("Graphs", "Practice breadth first and depth first search."),
    step("Dynamic programming", "Solve classic problems bottom up and top down."),
    step("Timed practice", "Solve a set of mixed problems under a time limit."),
];

const LANGUAGE_STEPS: &[TaskTemplate] = &[
    step("Learn pronunciation basics", "Practice the alphabet and core sounds."),
    step("Build a starter vocabulary", "Learn the most common words with spaced repetition."),
    step("Study basic grammar", "Cover present tense, articles and sentence order."),
    step("Listen daily", "Follow a podcast or video made for learners."),
    step("Read short texts", "Read graded stories and note new words."),
    step("Write a short journal entry", "Describe your day in a few sentences."),
    step("Hold a conversation", "Talk with a partner or tutor for fifteen minutes."),
    step("Review weak spots", "Go back over the words and rules you keep missing."),
];

const MATHEMATICS_STEPS: &[TaskTemplate] = &[
    step("Review prerequisites", "List the concepts the topic builds on and refresh them."),
    step("Study definitions", "Write out the key definitions in your own words."),
    step("Work through examples", "Follow worked examples step by step."),
    step("Solve practice problems", "Complete a problem set without looking at solutions."),
    step("Prove a result", "Reconstruct the proof of one central theorem."),
    step("Apply to a real problem", "Use the technique on a problem from another field."),
    step("Summarize the topic", "Write a one page summary sheet."),
    step("Take a practice test", "Solve a timed set of exam style problems."),
];

const FITNESS_STEPS: &[TaskTemplate] = &[
    step("Assess your baseline", "Record current endurance, strength and flexibility."),
    step("Plan the training week", "Schedule sessions and rest days."),
    step("Endurance session", "Complete a steady cardio session at a comfortable pace."),
    step("Strength session", "Work through a full body strength routine."),
    step("Mobility session", "Spend time on stretching and mobility drills."),
    step("Interval session", "Alternate hard efforts with recovery periods."),
    step("Recovery day", "Focus on sleep, nutrition and light movement."),
    step("Measure progress", "Repeat the baseline test and compare."),
];

const GENERAL_STEPS: &[TaskTemplate] = &[
    step("Define what success looks like", "Write down a concrete, checkable outcome for this goal."),
    step("Research the basics", "Collect a few good resources and skim them."),
    step("Learn the fundamentals", "Study the core concepts from your best resource."),
    step("Practice", "Apply what you learned in a short hands on exercise."),
    step("Go deeper", "Pick one subtopic and study it in detail."),
    step("Build something", "Produce a small artifact that uses the new skill."),
    step("Get feedback", "Share your work and collect feedback."),
    step("Reflect and plan", "Review progress and adjust the plan for the next stretch."),
];

impl Topic {
    pub fn detect(title: &str) -> Topic {
        let words: Vec<String> = title
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '+'))
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        let padded = format!(" {} ", words.join(" "));

        TOPIC_KEYWORDS
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| padded.contains(&format!(" {} ", keyword)))
            })
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }

    pub fn template(self) -> &'static [TaskTemplate] {
        match self {
            Topic::Programming => PROGRAMMING_STEPS,
            Topic::WebDevelopment => WEB_STEPS,
            Topic::DataScience => DATA_SCIENCE_STEPS,
            Topic::MachineLearning => MACHINE_LEARNING_STEPS,
            Topic::Algorithms => ALGORITHM_STEPS,
            Topic::Language => LANGUAGE_STEPS,
            Topic::Mathematics => MATHEMATICS_STEPS,
            Topic::Fitness => FITNESS_STEPS,
            Topic::General => GENERAL_STEPS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Programming => "programming",
            Topic::WebDevelopment => "web_development",
            Topic::DataScience => "data_science",
            Topic::MachineLearning => "machine_learning",
            Topic::Algorithms => "algorithms",
            Topic::Language => "language",
            Topic::Mathematics => "mathematics",
            Topic::Fitness => "fitness",
            Topic::General => "general",
        }
    }
}

#[derive(Debug)]
pub struct GeneratedPlan {
    pub topic: Topic,
    pub tasks: Vec<NewTask>,
}

pub fn generate_tasks(goal: &Goal) -> InternalResult<GeneratedPlan> {
    plan_tasks(&goal.title, goal.duration_weeks, goal.intensity)
}

/// `duration_weeks * tasks_per_week` tasks, filled week by week in template
/// order. Orders run 0..n with no gaps; every task keeps the implicit chain.
pub fn plan_tasks(
    title: &str,
    duration_weeks: i64,
    intensity: Intensity,
) -> InternalResult<GeneratedPlan> {
    if duration_weeks <= 0 {
        return Err(InternalError::validation(format!(
            "Cannot generate tasks for a duration of {} weeks",
            duration_weeks
        )));
    }

    let topic = Topic::detect(title);
    let template = topic.template();
    let per_week = intensity.tasks_per_week();
    let total = duration_weeks * per_week;

    let tasks = (0..total)
        .map(|order| {
            let index = order as usize;
            let step = &template[index % template.len()];
            let round = index / template.len();

            let task_title = if round == 0 {
                step.title.to_string()
            } else {
                format!("{} (round {})", step.title, round + 1)
            };

            NewTask {
                week_number: order / per_week + 1,
                title: task_title,
                description: format!("{} Part of \"{}\".", step.description, title.trim()),
                order,
                dependencies: None,
            }
        })
        .collect();

    Ok(GeneratedPlan { topic, tasks })
}
