//! Built-in datasets returned when neither the backend nor the static
//! assets can be read. Small on purpose: one representative slice per kind.

use super::content::{Career, InterviewQuestion, PracticeProblem, Resource};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn careers() -> Vec<Career> {
    vec![
        Career {
            id: "software-engineer".into(),
            name: "Software Engineer".into(),
            description: "Design, build and maintain software systems and applications.".into(),
            detailed_description: String::new(),
            category: "Technology".into(),
            skills: strings(&["Programming", "Data Structures", "Algorithms", "System Design"]),
            salary: "$120,730".into(),
            growth_rate: "25%".into(),
            education: "Bachelor's in Computer Science or related field".into(),
        },
        Career {
            id: "data-scientist".into(),
            name: "Data Scientist".into(),
            description: "Extract insight from data with statistics and machine learning.".into(),
            detailed_description: String::new(),
            category: "Technology".into(),
            skills: strings(&["Python", "Statistics", "Machine Learning", "SQL"]),
            salary: "$108,020".into(),
            growth_rate: "35%".into(),
            education: "Bachelor's or Master's in a quantitative field".into(),
        },
        Career {
            id: "biomedical-engineer".into(),
            name: "Biomedical Engineer".into(),
            description: "Apply engineering principles to medicine and biology.".into(),
            detailed_description: String::new(),
            category: "Engineering".into(),
            skills: strings(&["Biology", "CAD", "Signal Processing"]),
            salary: "$99,550".into(),
            growth_rate: "5%".into(),
            education: "Bachelor's in Biomedical Engineering".into(),
        },
        Career {
            id: "mathematician".into(),
            name: "Mathematician".into(),
            description: "Develop and apply mathematical theory to solve problems.".into(),
            detailed_description: String::new(),
            category: "Mathematics".into(),
            skills: strings(&["Proof Writing", "Modeling", "Statistics"]),
            salary: "$112,110".into(),
            growth_rate: "11%".into(),
            education: "Master's or PhD in Mathematics".into(),
        },
    ]
}

pub fn resources() -> Vec<Resource> {
    vec![
        Resource {
            id: "cs50-introduction-to-computer-science".into(),
            title: "CS50: Introduction to Computer Science".into(),
            description: "Harvard's introduction to the intellectual enterprises of computer science."
                .into(),
            platform: "edX".into(),
            url: "https://cs50.harvard.edu/x/".into(),
            category: "Computer Science".into(),
            difficulty: "Beginner".into(),
            duration: "12 weeks".into(),
            rating: "4.9".into(),
        },
        Resource {
            id: "machine-learning-specialization".into(),
            title: "Machine Learning Specialization".into(),
            description: "Foundations of supervised and unsupervised learning.".into(),
            platform: "Coursera".into(),
            url: "https://www.coursera.org/specializations/machine-learning-introduction".into(),
            category: "Data Science".into(),
            difficulty: "Intermediate".into(),
            duration: "3 months".into(),
            rating: "4.9".into(),
        },
        Resource {
            id: "linear-algebra".into(),
            title: "Linear Algebra".into(),
            description: "Vectors, matrices and linear transformations.".into(),
            platform: "Khan Academy".into(),
            url: "https://www.khanacademy.org/math/linear-algebra".into(),
            category: "Mathematics".into(),
            difficulty: "Intermediate".into(),
            duration: "Self-paced".into(),
            rating: "4.8".into(),
        },
    ]
}

pub fn practice_problems() -> Vec<PracticeProblem> {
    let coders = strings(&["Software Engineer", "Data Scientist", "AI Engineer"]);
    vec![
        PracticeProblem {
            id: "two-sum".into(),
            title: "Two Sum".into(),
            description: "Return indices of the two numbers in an array that add up to a target."
                .into(),
            difficulty: "Easy".into(),
            category: "Arrays".into(),
            time_limit: 15,
            points: 100,
            language: "python".into(),
            careers: coders.clone(),
        },
        PracticeProblem {
            id: "valid-parentheses".into(),
            title: "Valid Parentheses".into(),
            description: "Determine whether a string of brackets is correctly balanced.".into(),
            difficulty: "Easy".into(),
            category: "Stacks".into(),
            time_limit: 15,
            points: 100,
            language: "python".into(),
            careers: coders.clone(),
        },
        PracticeProblem {
            id: "binary-search".into(),
            title: "Binary Search".into(),
            description: "Find a target in a sorted array in logarithmic time.".into(),
            difficulty: "Easy".into(),
            category: "Searching".into(),
            time_limit: 10,
            points: 100,
            language: "python".into(),
            careers: coders,
        },
    ]
}

pub fn interview_questions() -> Vec<InterviewQuestion> {
    vec![
        InterviewQuestion {
            id: "1".into(),
            title: "Two Sum".into(),
            description: "Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.".into(),
            difficulty: "Easy".into(),
            category: "Arrays".into(),
            example: "Input: nums = [2,7,11,15], target = 9, Output: [0,1]".into(),
            hint: "Use a hash map to store complements".into(),
            solution_approach: "Store each number's index; for every number check whether its complement was seen.".into(),
            related_topics: strings(&["Arrays", "Hash Table"]),
        },
        InterviewQuestion {
            id: "2".into(),
            title: "Valid Parentheses".into(),
            description: "Given a string containing only brackets, determine if the input string is valid.".into(),
            difficulty: "Easy".into(),
            category: "Stacks".into(),
            example: "Input: s = '()[]{}', Output: true".into(),
            hint: "Use a stack to keep track of opening brackets".into(),
            solution_approach: "Push opening brackets and pop on each matching closing bracket.".into(),
            related_topics: strings(&["Stack", "String"]),
        },
        InterviewQuestion {
            id: "3".into(),
            title: "Binary Search".into(),
            description: "Search a target in an ascending sorted array and return its index or -1.".into(),
            difficulty: "Easy".into(),
            category: "Searching".into(),
            example: "Input: nums = [-1,0,3,5,9,12], target = 9, Output: 4".into(),
            hint: "Halve the search interval each step".into(),
            solution_approach: "Keep left/right bounds and compare against the middle element.".into(),
            related_topics: strings(&["Binary Search", "Arrays"]),
        },
    ]
}
