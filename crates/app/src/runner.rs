use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quiz_core::model::ArticleId;
use services::{AppServices, ControllerError, QuizView, Step};

type Input = Lines<BufReader<Stdin>>;

/// Play the quiz of one article on stdin/stdout.
pub async fn take_quiz(
    app: &AppServices,
    article_id: ArticleId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = app.open_quiz(article_id).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let view = controller.view();
    print_header(&view);
    if view.already_completed {
        if let Some(done) = &view.completion {
            println!("You already completed this quiz with {}.", done.score);
        }
        if !confirm(&mut input, "Retake it? [y/N] ").await? {
            return Ok(());
        }
        controller.retake().await?;
    }

    loop {
        let view = controller.view();
        let Some(question) = view.question else {
            break;
        };
        println!();
        println!(
            "Question {}/{}  ({}s left)",
            view.question_number, view.total_questions, view.countdown
        );
        println!("{}", question.text);
        for (i, choice) in question.choices.iter().enumerate() {
            println!("  {}. {choice}", i + 1);
        }

        let Some(choice) = read_choice(&mut input, question.choices.len()).await? else {
            // stdin closed: leave without recording anything
            controller.close();
            return Ok(());
        };
        match controller.choose(choice) {
            Ok(selection) if selection.is_correct => println!("Correct!"),
            Ok(_) => println!("Not quite."),
            Err(ControllerError::Session(e)) => {
                println!("{e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if let Step::Completed {
            outcome,
            completion,
        } = controller.settle().await?
        {
            println!();
            println!(
                "Done! {} of {} correct, score {}.",
                outcome.correct, outcome.total, outcome.score
            );
            if completion.is_none() {
                println!("(your result could not be saved)");
            }
            break;
        }
    }

    controller.close();
    Ok(())
}

fn print_header(view: &QuizView) {
    println!("{}", view.title);
    if let Some(description) = &view.description {
        println!("{description}");
    }
}

async fn read_choice(input: &mut Input, len: usize) -> std::io::Result<Option<usize>> {
    while let Some(line) = input.next_line().await? {
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=len).contains(&n) => return Ok(Some(n - 1)),
            _ => println!("Enter a number between 1 and {len}."),
        }
    }
    Ok(None)
}

async fn confirm(input: &mut Input, prompt: &str) -> std::io::Result<bool> {
    println!("{prompt}");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
